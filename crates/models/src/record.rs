use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// Record is a single row of a remote entity type: a mapping of field name
/// to a scalar or null value. Records are immutable once fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(serde_json::Map<String, Value>);

impl Record {
    /// Name of the identifier field carried by every remote record.
    pub const ID: &'static str = "Id";

    /// Build a Record from a JSON document returned by the remote store.
    /// Nested objects and arrays (such as the remote `attributes` envelope)
    /// are not scalars and are dropped. Returns None if `doc` isn't an object.
    pub fn from_value(doc: Value) -> Option<Self> {
        let Value::Object(fields) = doc else {
            return None;
        };
        Some(Self(
            fields
                .into_iter()
                .filter(|(_, value)| !value.is_object() && !value.is_array())
                .collect(),
        ))
    }

    /// The remote identifier of this record, if it has a non-empty one.
    pub fn id(&self) -> Option<&str> {
        match self.0.get(Self::ID) {
            Some(Value::String(id)) if !id.is_empty() => Some(id),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The stringified value of `field`, or None if it's null or absent.
    pub fn text(&self, field: &str) -> Option<Cow<'_, str>> {
        self.0.get(field).and_then(stringify)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Stringify a scalar value for comparison. Null has no string form:
/// it's never equal to the empty string.
pub fn stringify(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

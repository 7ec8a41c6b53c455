use super::{RecordStore, StoreError};
use futures::future::{BoxFuture, FutureExt};
use models::Record;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

/// FixtureStore is an in-memory RecordStore of fixture records.
///
/// Entity types which aren't described explicitly have the fields of their
/// fixture records. Types which are neither described nor have records
/// don't exist, and fields which aren't described don't exist.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FixtureStore {
    #[serde(default = "default_org_id")]
    org_id: String,
    #[serde(default)]
    describe: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    records: BTreeMap<String, Vec<Value>>,
    #[serde(skip)]
    log: Mutex<Log>,
}

/// Query is a logged batch query of a FixtureStore.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub object: String,
    pub id_field: String,
    pub ids: usize,
}

#[derive(Debug, Default)]
struct Log {
    describes: Vec<String>,
    queries: Vec<Query>,
}

fn default_org_id() -> String {
    "fixture".to_string()
}

impl FixtureStore {
    /// Parse a YAML or JSON fixture document.
    pub fn from_slice(content: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(content)
    }

    pub fn from_value(doc: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc)
    }

    /// Batch queries issued so far, in order.
    pub fn queries(&self) -> Vec<Query> {
        self.log().queries.clone()
    }

    /// Entity types described so far, in order.
    pub fn describes(&self) -> Vec<String> {
        self.log().describes.clone()
    }

    fn fields_of(&self, object: &str) -> Result<BTreeSet<String>, StoreError> {
        if let Some(fields) = self.describe.get(object) {
            return Ok(fields.clone());
        }
        let Some(records) = self.records.get(object) else {
            return Err(StoreError::api(
                "INVALID_TYPE",
                format!("sObject type '{object}' is not supported."),
            ));
        };

        let mut fields: BTreeSet<String> = records
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|record| record.keys().cloned())
            .collect();
        fields.insert(Record::ID.to_string());

        Ok(fields)
    }

    fn select(
        &self,
        object: &str,
        fields: &[String],
        id_field: &str,
        ids: &[String],
    ) -> Result<Vec<Record>, StoreError> {
        let available = self.fields_of(object)?;

        if let Some(field) = fields
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(id_field))
            .find(|field| !available.contains(*field))
        {
            return Err(StoreError::api(
                "INVALID_FIELD",
                format!("No such column '{field}' on entity '{object}'."),
            ));
        }

        let rows = self.records.get(object).map(Vec::as_slice).unwrap_or_default();

        Ok(rows
            .iter()
            .filter_map(Value::as_object)
            .filter(|row| {
                row.get(id_field)
                    .and_then(models::stringify)
                    .map(|value| ids.iter().any(|id| *id == value))
                    .unwrap_or_default()
            })
            .map(|row| {
                fields
                    .iter()
                    .map(|field| (field.clone(), row.get(field).cloned().unwrap_or(Value::Null)))
                    .filter(|(_, value)| !value.is_object() && !value.is_array())
                    .collect()
            })
            .collect())
    }

    fn log(&self) -> std::sync::MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for FixtureStore {
    fn org_id(&self) -> &str {
        &self.org_id
    }

    fn describe<'a>(
        &'a self,
        object: &'a str,
    ) -> BoxFuture<'a, Result<BTreeSet<String>, StoreError>> {
        self.log().describes.push(object.to_string());
        let result = self.fields_of(object);

        async move { result }.boxed()
    }

    fn batch_query<'a>(
        &'a self,
        object: &'a str,
        fields: &'a [String],
        id_field: &'a str,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Record>, StoreError>> {
        self.log().queries.push(Query {
            object: object.to_string(),
            id_field: id_field.to_string(),
            ids: ids.len(),
        });
        let result = self.select(object, fields, id_field, ids);

        async move { result }.boxed()
    }
}

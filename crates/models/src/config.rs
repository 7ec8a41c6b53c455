use super::{Link, LinkPath, Record, Registry, RegistryError};
use lazy_static::lazy_static;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of display fields selected for each entity type.
pub const MAX_FIELDS_PER_OBJECT: usize = 5;

lazy_static! {
    static ref DEFAULT_REGISTRY: Registry = Registry::default();
}

/// ExplorerConfig is the operator's configuration of an explorer run.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ExplorerConfig {
    /// # Display fields selected for each entity type.
    /// Types without a selection display the registry's default fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Vec<String>>,
    /// # Display order and visibility of linked entity types.
    /// Types which aren't listed are displayed after listed ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<ObjectVisibility>,
    /// # Active link paths of each contact point type.
    /// Types without a selection are reached through both paths.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contact_point_links: BTreeMap<String, Vec<LinkPath>>,
    /// # Alert definitions, as authored by the operator.
    /// Malformed definitions are dropped when the configuration is used.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub alerts: serde_json::Value,
    /// # Override of the built-in schema registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<Registry>,
}

/// ObjectVisibility is the display setting of one linked entity type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ObjectVisibility {
    pub key: String,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse explorer configuration")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid schema registry")]
    Registry(#[from] RegistryError),
}

impl ExplorerConfig {
    /// Parse a YAML or JSON configuration document and validate its registry.
    pub fn from_slice(content: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = if content.iter().all(u8::is_ascii_whitespace) {
            Self::default()
        } else {
            serde_yaml::from_slice(content)?
        };
        config.registry().validate()?;
        Ok(config)
    }

    /// The active schema registry: the configured override, or the built-in default.
    pub fn registry(&self) -> &Registry {
        self.registry.as_ref().unwrap_or(&DEFAULT_REGISTRY)
    }

    /// Sanitized display fields of `object`: the operator's selection if it
    /// has one, or else the registry's defaults. Fields are trimmed, the
    /// identifier field is removed, duplicates are removed, and the list is
    /// capped at MAX_FIELDS_PER_OBJECT.
    pub fn display_fields(&self, object: &str) -> Vec<String> {
        let selected = sanitize_fields(self.fields.get(object).into_iter().flatten());

        if !selected.is_empty() {
            return selected;
        }
        match self.registry().get(object) {
            Some(def) => sanitize_fields(&def.default_fields),
            None => Vec::new(),
        }
    }

    /// Display order and visibility of every linked type of the registry.
    /// Unknown and repeated keys are ignored.
    pub fn objects(&self) -> Vec<ObjectVisibility> {
        let registry = self.registry();
        let mut out: Vec<ObjectVisibility> = Vec::new();

        for entry in &self.objects {
            let known = registry
                .get(&entry.key)
                .map(|def| !matches!(def.link, Link::Root))
                .unwrap_or_default();

            if known && !out.iter().any(|o| o.key == entry.key) {
                out.push(entry.clone());
            }
        }
        for def in registry.linked() {
            if !out.iter().any(|o| o.key == def.name) {
                out.push(ObjectVisibility {
                    key: def.name.clone(),
                    hidden: false,
                });
            }
        }
        out
    }

    /// Active link paths of contact point type `object`, in canonical order.
    /// Paths for which the registry has no field are never active.
    pub fn link_paths(&self, object: &str) -> Vec<LinkPath> {
        let Some(Link::ContactPoint {
            contact_field,
            individual_field,
        }) = self.registry().get(object).map(|def| &def.link)
        else {
            return Vec::new();
        };

        let selected = self
            .contact_point_links
            .get(object)
            .filter(|paths| !paths.is_empty());

        LinkPath::all()
            .iter()
            .copied()
            .filter(|path| selected.map(|s| s.contains(path)).unwrap_or(true))
            .filter(|path| match path {
                LinkPath::Contact => contact_field.is_some(),
                LinkPath::Individual => individual_field.is_some(),
            })
            .collect()
    }
}

fn sanitize_fields<'a, I>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out: Vec<String> = Vec::new();

    for field in fields {
        let field = field.trim();

        if field.is_empty() || field.eq_ignore_ascii_case(Record::ID) {
            continue;
        }
        if out.iter().any(|f| f == field) {
            continue;
        }
        if out.len() == MAX_FIELDS_PER_OBJECT {
            break;
        }
        out.push(field.to_string());
    }
    out
}

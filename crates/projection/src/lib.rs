use alerts::FieldMatch;
use indexmap::IndexMap;
use models::{AlertDefinition, LinkSource};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

mod annotate;
mod layout;
mod render;

pub use annotate::{attach_alerts, Triggered};
pub use layout::{Layout, ObjectLayout};
pub use render::{render_account, summary};

/// ExplorerData is the outward payload of a run.
#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerData {
    pub accounts: Vec<AccountPayload>,
    /// Visible linked entity types, in display order.
    pub objects: Vec<ObjectView>,
    /// Number of fetched records of each visible entity type.
    pub summary: IndexMap<String, usize>,
    /// Alert definitions which were evaluated.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<AlertDefinition>,
    /// Warnings of degraded entity types and failed alerts.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub warnings: BTreeMap<String, String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ObjectView {
    pub key: String,
    pub label: String,
}

/// AccountPayload is the rendering of one requested account.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayload {
    /// Requested account identifier.
    pub id: String,
    pub record_key: String,
    pub fields: Vec<FieldEntry>,
    /// Alerts triggered by the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<Triggered>>,
    /// Matches of triggered alerts against the account record itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_details: Option<Vec<RecordAlert>>,
    pub related: IndexMap<String, Vec<RecordPayload>>,
}

/// RecordPayload is the rendering of one related record.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayload {
    pub id: Option<String>,
    pub record_key: String,
    pub fields: Vec<FieldEntry>,
    /// Identifiers of the alerts which matched this record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_details: Option<Vec<RecordAlert>>,
    /// Paths through which a contact point was reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_sources: Option<Vec<LinkSource>>,
}

/// FieldEntry is one rendered field of a record.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldEntry {
    pub name: String,
    pub value: Value,
    /// Queried but not selected for display.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_details: Option<Vec<FieldAlert>>,
}

/// RecordAlert is the detail of one alert's match against a record.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordAlert {
    pub alert_id: String,
    pub label: String,
    pub matched_fields: Vec<FieldMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// FieldAlert is the detail of one alert's match against a field.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldAlert {
    pub alert_id: String,
    pub operator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_value: Option<String>,
    pub actual_value: Value,
    pub matched: bool,
}

impl FieldEntry {
    fn new(name: &str, value: Value, hidden: bool) -> Self {
        Self {
            name: name.to_string(),
            value,
            hidden,
            alerts: None,
            alert_details: None,
        }
    }
}

// Push `item` onto an optional list, creating it if absent.
fn push_some<T: PartialEq>(list: &mut Option<Vec<T>>, item: T) {
    let list = list.get_or_insert_with(Vec::new);
    if !list.contains(&item) {
        list.push(item);
    }
}

use super::{AccountPayload, FieldEntry, Layout, ObjectLayout, RecordPayload};
use graph::{AccountGraph, GraphRecord, Pools};
use indexmap::IndexMap;
use models::Record;
use serde_json::Value;

/// Render the account of `graph` and its visible related records.
/// Rendered payloads carry no alert annotations.
pub fn render_account(layout: &Layout, graph: &AccountGraph) -> AccountPayload {
    let account = graph.account();

    let related: IndexMap<String, Vec<RecordPayload>> = layout
        .visible()
        .map(|object| {
            let records: Vec<RecordPayload> = graph
                .records(&object.key)
                .iter()
                .map(|record| render_record(object, record))
                .collect();
            (object.key.clone(), records)
        })
        .collect();

    AccountPayload {
        id: graph.account_id.clone(),
        record_key: account.key.clone(),
        fields: render_fields(&layout.account, &account.record),
        alerts: None,
        alert_details: None,
        related,
    }
}

/// Number of fetched records of each visible entity type.
pub fn summary(layout: &Layout, pools: &Pools) -> IndexMap<String, usize> {
    layout
        .visible()
        .map(|object| (object.key.clone(), pools.count(&object.key)))
        .collect()
}

fn render_record(layout: &ObjectLayout, record: &GraphRecord) -> RecordPayload {
    RecordPayload {
        id: record.id().map(str::to_string),
        record_key: record.key.clone(),
        fields: render_fields(layout, &record.record),
        alerts: None,
        alert_details: None,
        link_sources: if record.link_sources.is_empty() {
            None
        } else {
            Some(record.link_sources.clone())
        },
    }
}

// The identifier, then display fields, then link fields which aren't displayed.
fn render_fields(layout: &ObjectLayout, record: &Record) -> Vec<FieldEntry> {
    let value = |field: &str| record.get(field).cloned().unwrap_or(Value::Null);

    let mut fields: Vec<FieldEntry> = std::iter::once(Record::ID)
        .chain(layout.display_fields.iter().map(String::as_str))
        .map(|field| FieldEntry::new(field, value(field), false))
        .collect();

    for field in &layout.link_fields {
        if !fields.iter().any(|entry| entry.name == *field) {
            fields.push(FieldEntry::new(field, value(field), true));
        }
    }
    fields
}

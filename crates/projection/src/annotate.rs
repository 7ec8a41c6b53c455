use super::{push_some, AccountPayload, FieldAlert, FieldEntry, RecordAlert, RecordPayload};
use alerts::Match;
use models::{AlertDefinition, ACCOUNT};
use serde::Serialize;

/// Triggered is an alert which passed for an account, and its matches.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Triggered {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub matches: Vec<Match>,
}

impl Triggered {
    pub fn new(alert: &AlertDefinition, matches: Vec<Match>) -> Self {
        Self {
            id: alert.id.clone(),
            label: alert.label.clone(),
            description: alert.description.clone(),
            matches,
        }
    }
}

// Annotation targets shared by accounts and related records.
trait Annotated {
    fn parts(&mut self) -> (&mut Vec<FieldEntry>, &mut Option<Vec<RecordAlert>>);
}

impl Annotated for AccountPayload {
    fn parts(&mut self) -> (&mut Vec<FieldEntry>, &mut Option<Vec<RecordAlert>>) {
        (&mut self.fields, &mut self.alert_details)
    }
}

impl Annotated for RecordPayload {
    fn parts(&mut self) -> (&mut Vec<FieldEntry>, &mut Option<Vec<RecordAlert>>) {
        (&mut self.fields, &mut self.alert_details)
    }
}

/// Attach the `triggered` alerts of an account to its rendered `payload`.
///
/// The account lists every triggered alert. Each matched record lists the
/// identifiers of its alerts and their details, and each matched field is
/// annotated with its operator, filter value and actual value. Matched fields
/// which weren't rendered are appended as hidden fields. Matches of records
/// which aren't rendered (such as those of hidden types) annotate nothing.
pub fn attach_alerts(payload: &mut AccountPayload, triggered: Vec<Triggered>) {
    for alert in &triggered {
        for m in &alert.matches {
            if m.object == ACCOUNT && m.record_key == payload.record_key {
                annotate(payload, alert, m);
                continue;
            }

            let record = payload
                .related
                .get_mut(&m.object)
                .and_then(|records| records.iter_mut().find(|r| r.record_key == m.record_key));

            match record {
                Some(record) => {
                    push_some(&mut record.alerts, alert.id.clone());
                    annotate(record, alert, m);
                }
                None => tracing::trace!(
                    alert = %alert.id,
                    object = %m.object,
                    record_key = %m.record_key,
                    "match of a record which isn't rendered"
                ),
            }
        }
    }

    if !triggered.is_empty() {
        payload.alerts = Some(triggered);
    }
}

fn annotate(target: &mut impl Annotated, alert: &Triggered, m: &Match) {
    let (fields, details) = target.parts();

    push_some(
        details,
        RecordAlert {
            alert_id: alert.id.clone(),
            label: alert.label.clone(),
            matched_fields: m.matched_fields.clone(),
            message: m.message.clone(),
        },
    );

    for field in &m.matched_fields {
        let index = match fields.iter().position(|entry| entry.name == field.name) {
            Some(index) => index,
            None => {
                fields.push(FieldEntry::new(
                    &field.name,
                    field.actual_value.clone(),
                    true,
                ));
                fields.len() - 1
            }
        };
        let entry = &mut fields[index];

        push_some(&mut entry.alerts, alert.id.clone());
        push_some(
            &mut entry.alert_details,
            FieldAlert {
                alert_id: alert.id.clone(),
                operator: field.operator.clone(),
                filter_value: field.filter_value.clone(),
                actual_value: field.actual_value.clone(),
                matched: field.matched,
            },
        );
    }
}

use super::{rule, Error, Location};
use models::{AlertDefinition, AlertRule};
use serde_json::{Map, Value};

pub fn walk_all_alerts(alerts: &Value, errors: &mut Vec<Error>) -> Vec<AlertDefinition> {
    let root = Location::Root;

    let alerts: &[Value] = match alerts {
        Value::Null => &[],
        Value::Array(alerts) => alerts,
        _ => {
            Error::WrongShape {
                location: root.to_string(),
                expected: "an array of alerts",
            }
            .push(errors);
            &[]
        }
    };
    let mut out: Vec<AlertDefinition> = Vec::with_capacity(alerts.len());

    for (index, alert) in alerts.iter().enumerate() {
        let location = root.push_item(index);

        let Some(alert) = rule::as_object(location, alert, errors) else {
            continue;
        };
        let Some(mut alert) = walk_alert(location, alert, errors) else {
            continue;
        };

        if out.iter().any(|prior| prior.id == alert.id) {
            let assigned = new_id();
            Error::DuplicateId {
                location: location.push_prop("id").to_string(),
                id: std::mem::replace(&mut alert.id, assigned.clone()),
                assigned,
            }
            .push(errors);
        }
        out.push(alert);
    }
    out
}

fn walk_alert(
    location: Location,
    alert: &Map<String, Value>,
    errors: &mut Vec<Error>,
) -> Option<AlertDefinition> {
    let label = match alert.get("label") {
        Some(Value::String(label)) if !label.trim().is_empty() => label.trim().to_string(),
        _ => {
            Error::LabelEmpty {
                location: location.push_prop("label").to_string(),
            }
            .push(errors);
            return None;
        }
    };
    let id = match alert.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
        _ => new_id(),
    };
    let description = match alert.get("description") {
        Some(Value::String(d)) if !d.trim().is_empty() => Some(d.trim().to_string()),
        _ => None,
    };

    // The shape of the rule is authoritative over a declared `mode`.
    let rule = match (alert.get("rule"), alert.get("filters")) {
        (Some(Value::Array(groups)), _) => AlertRule::Simple(rule::walk_filter_groups(
            location.push_prop("rule"),
            groups,
            errors,
        )),
        (Some(node @ Value::Object(_)), _) => {
            match rule::walk_node(location.push_prop("rule"), node, errors) {
                Some(node) => AlertRule::Advanced(node),
                None => AlertRule::Simple(Vec::new()),
            }
        }
        (None | Some(Value::Null), Some(Value::Array(filters))) => AlertRule::Simple(
            rule::walk_legacy_filters(location.push_prop("filters"), filters, errors),
        ),
        _ => AlertRule::Simple(Vec::new()),
    };

    if matches!(&rule, AlertRule::Simple(groups) if groups.is_empty()) {
        Error::NoRule {
            location: location.to_string(),
        }
        .push(errors);
        return None;
    }

    Some(AlertDefinition {
        id,
        label,
        description,
        mode: rule.mode(),
        rule,
    })
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

use models::AlertDefinition;

mod alert;
mod errors;
mod location;
mod rule;

pub use errors::Error;
pub use location::Location;

/// Sanitized alert definitions, and the errors of components which were
/// dropped or rewritten to produce them.
#[derive(Debug, Default)]
pub struct Sanitized {
    pub alerts: Vec<AlertDefinition>,
    pub errors: Vec<Error>,
}

/// Sanitize untrusted, operator-authored alert definitions.
///
/// Malformed components are dropped rather than failing the batch:
/// filters and nodes which are invalid are removed from their parent,
/// parents left without valid children are removed in turn, and alerts
/// left without any rule are dropped entirely. Missing identifiers are
/// generated and duplicated identifiers are replaced with fresh ones.
///
/// Sanitizing the serialization of already-sanitized alerts returns
/// them unchanged.
pub fn sanitize_alerts(alerts: &serde_json::Value) -> Sanitized {
    let mut errors = Vec::new();
    let alerts = alert::walk_all_alerts(alerts, &mut errors);

    tracing::debug!(
        alerts = alerts.len(),
        errors = errors.len(),
        "sanitized alert definitions"
    );
    Sanitized { alerts, errors }
}

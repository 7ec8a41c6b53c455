use models::Operator;

/// Error is a defect of an operator-authored alert definition.
/// Each error names the JSON pointer of the component which was
/// dropped or rewritten.
#[must_use]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{location}: expected {expected}")]
    WrongShape {
        location: String,
        expected: &'static str,
    },
    #[error("{location}: alert label cannot be empty")]
    LabelEmpty { location: String },
    #[error("{location}: alert id {id:?} is already in use and was replaced with {assigned:?}")]
    DuplicateId {
        location: String,
        id: String,
        assigned: String,
    },
    #[error("{location}: {what} cannot be empty")]
    NameEmpty {
        location: String,
        what: &'static str,
    },
    #[error("{location}: {value:?} is not a recognized {what}")]
    Unrecognized {
        location: String,
        what: &'static str,
        value: String,
    },
    #[error("{location}: operator {operator} requires a non-empty string value")]
    ValueRequired { location: String, operator: Operator },
    #[error("{location}: {kind} nodes cannot be direct children of a scope")]
    ScopeChild {
        location: String,
        kind: &'static str,
    },
    #[error("{location}: {kind} has no valid children")]
    NoChildren {
        location: String,
        kind: &'static str,
    },
    #[error("{location}: alert has no valid rule")]
    NoRule { location: String },
}

impl Error {
    pub fn push(self, errors: &mut Vec<Error>) {
        tracing::debug!(error = %self, "sanitized alert definition");
        errors.push(self);
    }
}

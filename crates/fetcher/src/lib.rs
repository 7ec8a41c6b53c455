use futures::future::BoxFuture;
use models::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

mod cache;
mod fetch;
mod fixture;
mod plan;
mod warnings;

pub use cache::FieldCache;
pub use fetch::{fetch, Error, Fetched, CHUNK_SIZE};
pub use fixture::{FixtureStore, Query};
pub use plan::ObjectPlan;
pub use warnings::Warnings;

/// Error codes of the remote store which indicate that an entity type or
/// field doesn't exist. They degrade a single type rather than a whole run.
pub const RECOVERABLE_ERROR_CODES: &[&str] = &[
    "INVALID_TYPE",
    "INVALID_FIELD",
    "INVALID_FIELD_FOR_INSERT_UPDATE",
];

/// RecordStore is a delegated trait through which records and
/// schemas of the remote store are fetched.
pub trait RecordStore: Send + Sync {
    /// Identity of the remote organization, which scopes cached schemas.
    fn org_id(&self) -> &str;

    /// Names of the fields of entity type `object`.
    fn describe<'a>(&'a self, object: &'a str)
        -> BoxFuture<'a, Result<BTreeSet<String>, StoreError>>;

    /// Select `fields` of `object` records having an `id_field` among `ids`.
    fn batch_query<'a>(
        &'a self,
        object: &'a str,
        fields: &'a [String],
        id_field: &'a str,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Record>, StoreError>>;
}

/// ApiError is a single error reported by the remote store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("remote store request failed: {}", serde_json::to_string(.0).unwrap_or_default())]
    Api(Vec<ApiError>),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl StoreError {
    /// Build an Api error having a single code and message.
    pub fn api(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api(vec![ApiError {
            error_code: error_code.into(),
            message: message.into(),
        }])
    }

    /// Is this an error of a single entity type's schema, as opposed to
    /// a failure of the remote store as a whole?
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Api(errors) => errors
                .iter()
                .any(|err| RECOVERABLE_ERROR_CODES.contains(&err.error_code.as_str())),
            Self::Transport(_) => false,
        }
    }

    /// Human-readable warning of a degraded entity type having `label`.
    pub fn warning(&self, label: &str) -> String {
        let messages: Vec<String> = match self {
            Self::Api(errors) => errors
                .iter()
                .filter_map(|ApiError { error_code, message }| {
                    match (message.is_empty(), error_code.is_empty()) {
                        (false, false) => Some(format!("{message} ({error_code})")),
                        (false, true) => Some(message.clone()),
                        (true, false) => Some(error_code.clone()),
                        (true, true) => None,
                    }
                })
                .collect(),
            Self::Transport(_) => Vec::new(),
        };

        if messages.is_empty() {
            format!("{label}: {self}")
        } else {
            format!("{label}: {}", messages.join("; "))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_recoverable_errors_and_warnings() {
        let err = StoreError::Api(vec![
            ApiError {
                error_code: "INVALID_FIELD".to_string(),
                message: "No such column 'Foo__c' on entity 'Case'.".to_string(),
            },
            ApiError {
                error_code: "".to_string(),
                message: "Check the field names".to_string(),
            },
        ]);
        assert!(err.is_recoverable());
        insta::assert_snapshot!(err.warning("Case"), @"Case: No such column 'Foo__c' on entity 'Case'. (INVALID_FIELD); Check the field names");

        let err = StoreError::api("REQUEST_LIMIT_EXCEEDED", "");
        assert!(!err.is_recoverable());
        insta::assert_snapshot!(err.warning("Order"), @"Order: REQUEST_LIMIT_EXCEEDED");

        let err = StoreError::Api(Vec::new());
        insta::assert_snapshot!(err.warning("Order"), @"Order: remote store request failed: []");

        let err = StoreError::Transport(anyhow::anyhow!("connection reset"));
        assert!(!err.is_recoverable());
        insta::assert_snapshot!(err.warning("Sale"), @"Sale: connection reset");
    }
}

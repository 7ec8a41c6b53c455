use graph::{AccountGraph, GraphRecord};
use indexmap::IndexMap;
use models::{AlertDefinition, AlertRule, Operator};
use serde::Serialize;
use serde_json::Value;

mod check;
mod operator;
mod simple;
mod tree;

pub use check::check;
pub use operator::test;

/// FieldMatch is the outcome of testing one field of a matched record.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldMatch {
    pub name: String,
    /// Operator which was applied, or the aggregate test which grouped the record.
    pub operator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_value: Option<String>,
    pub actual_value: Value,
    pub matched: bool,
}

/// Match is the provenance of a triggered alert: a record of the account
/// graph, and the fields which were responsible.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub object: String,
    pub record_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub matched_fields: Vec<FieldMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Match {
    fn new(object: &str, record: &GraphRecord) -> Self {
        Self {
            object: object.to_string(),
            record_key: record.key.clone(),
            record_id: record.id().map(str::to_string),
            matched_fields: Vec::new(),
            message: None,
        }
    }
}

/// Outcome of evaluating one alert against one account.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct Outcome {
    pub passed: bool,
    /// Matches of a passed alert, unique on (object, record_key).
    /// Always empty if the alert didn't pass.
    pub matches: Vec<Match>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("scope over {object} cannot directly contain a scope over {nested}")]
    NestedScope { object: String, nested: String },
    #[error("scope over {object} cannot directly contain an aggregate over {nested}")]
    AggregateInScope { object: String, nested: String },
    #[error("operator {operator} of {object}.{field} requires a value")]
    MissingValue {
        object: String,
        field: String,
        operator: Operator,
    },
    #[error("aggregate over {object}.{field} has minCount {min_count}, but it must be at least 2")]
    MinCount {
        object: String,
        field: String,
        min_count: usize,
    },
    #[error("alert has no filter groups")]
    EmptyRule,
}

/// Evaluate `alert` against the records of `graph`.
///
/// Evaluation is a pure function of its inputs. A rule which fails its
/// structural checks is an Error, and is never partially evaluated.
pub fn evaluate(alert: &AlertDefinition, graph: &AccountGraph) -> Result<Outcome, Error> {
    check(&alert.rule)?;

    let (passed, matches) = match &alert.rule {
        AlertRule::Simple(groups) => simple::evaluate(groups, graph),
        AlertRule::Advanced(node) => tree::evaluate(node, graph),
    };

    let matches = if passed { dedup(matches) } else { Vec::new() };

    tracing::trace!(
        alert = %alert.id,
        account_id = %graph.account_id,
        passed,
        matches = matches.len(),
        "evaluated alert"
    );
    Ok(Outcome { passed, matches })
}

/// Merge matches of the same (object, record_key), in order of first appearance.
/// Field lists are concatenated without repeating identical entries, and
/// distinct messages are joined.
pub fn dedup(matches: Vec<Match>) -> Vec<Match> {
    let mut merged: IndexMap<(String, String), Match> = IndexMap::new();

    for m in matches {
        let key = (m.object.clone(), m.record_key.clone());

        let Some(prior) = merged.get_mut(&key) else {
            merged.insert(key, m);
            continue;
        };
        for field in m.matched_fields {
            if !prior.matched_fields.contains(&field) {
                prior.matched_fields.push(field);
            }
        }
        if prior.record_id.is_none() {
            prior.record_id = m.record_id;
        }
        prior.message = match (prior.message.take(), m.message) {
            (Some(lhs), Some(rhs)) if lhs.split("; ").any(|part| part == rhs) => Some(lhs),
            (Some(lhs), Some(rhs)) => Some(format!("{lhs}; {rhs}")),
            (lhs, rhs) => lhs.or(rhs),
        };
    }
    merged.into_values().collect()
}

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

use alerts::{evaluate, Outcome};
use graph::{AccountGraph, GraphRecord};
use models::{AlertDefinition, Record};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

const ACCOUNT_ID: &str = "001000000000001AAA";

// Build an account graph having a Case for each of `flags`,
// and a ContactPointEmail for each of `emails`.
fn account_graph(flags: &[bool], emails: &[u8]) -> AccountGraph {
    let record = |doc: Value, key: String| GraphRecord {
        key,
        record: Arc::new(Record::from_value(doc).unwrap()),
        link_sources: Vec::new(),
    };

    let cases = flags
        .iter()
        .enumerate()
        .map(|(index, flag)| {
            let id = format!("500{index:015}");
            record(
                json!({"Id": id, "Flagged": if *flag { "yes" } else { "no" }}),
                id,
            )
        })
        .collect();
    let emails = emails
        .iter()
        .enumerate()
        .map(|(index, email)| {
            // Some contact points have no Id, and are keyed on their position.
            let doc = if index % 3 == 0 {
                json!({"EmailAddress": format!("{}@acme.test", email % 4)})
            } else {
                json!({"Id": format!("9PE{index:015}"), "EmailAddress": format!("{}@acme.test", email % 4)})
            };
            record(doc, format!("ContactPointEmail:{index}"))
        })
        .collect();

    AccountGraph::new(
        ACCOUNT_ID,
        record(json!({"Id": ACCOUNT_ID}), ACCOUNT_ID.to_string()),
        vec![
            ("Case".to_string(), cases),
            ("ContactPointEmail".to_string(), emails),
        ],
    )
}

fn alert(rule: Value) -> AlertDefinition {
    serde_json::from_value(json!({
        "id": "test",
        "label": "Test",
        "mode": "advanced",
        "rule": rule,
    }))
    .unwrap()
}

fn scope(quantifier: &str) -> AlertDefinition {
    alert(json!({"type": "scope", "object": "Case", "match": quantifier, "children": [
        {"type": "condition", "object": "Case", "field": "Flagged", "operator": "equals", "value": "yes"},
    ]}))
}

// A rule which matches records through several overlapping branches.
fn overlapping() -> AlertDefinition {
    alert(json!({"type": "group", "logic": "AND", "children": [
        {"type": "group", "logic": "OR", "children": [
            {"type": "scope", "object": "Case", "match": "ANY", "children": [
                {"type": "condition", "object": "Case", "field": "Flagged", "operator": "equals", "value": "yes"},
            ]},
            {"type": "condition", "object": "Case", "field": "Flagged", "operator": "not_blank"},
            {"type": "scope", "object": "Case", "match": "NONE", "children": [
                {"type": "condition", "object": "Case", "field": "Flagged", "operator": "equals", "value": "yes"},
            ]},
        ]},
        {"type": "group", "logic": "OR", "children": [
            {"type": "aggregate", "operation": "DUPLICATES", "object": "ContactPointEmail",
                "field": "EmailAddress", "minCount": 2},
            {"type": "condition", "object": "Account", "field": "Id", "operator": "not_null"},
        ]},
    ]}))
}

#[quickcheck]
fn test_quantifiers_partition_records(flags: Vec<bool>) -> bool {
    let graph = account_graph(&flags, &[]);
    let n = flags.len();
    let n_pass = flags.iter().filter(|flag| **flag).count();
    let n_fail = n - n_pass;

    let passed = |quantifier: &str| evaluate(&scope(quantifier), &graph).unwrap().passed;

    passed("ANY") == (n_pass >= 1)
        && passed("ALL") == (n >= 1 && n_fail == 0)
        && passed("NONE") == (n_pass == 0)
        && passed("NOT_ALL") == (n >= 1 && n_fail >= 1)
}

#[quickcheck]
fn test_evaluation_is_deterministic(flags: Vec<bool>, emails: Vec<u8>) -> bool {
    let graph = account_graph(&flags, &emails);
    let alert = overlapping();

    let first = evaluate(&alert, &graph).unwrap();
    let second = evaluate(&alert, &graph).unwrap();
    let third = evaluate(&alert, &account_graph(&flags, &emails)).unwrap();

    first == second && second == third
}

#[quickcheck]
fn test_matches_are_unique(flags: Vec<bool>, emails: Vec<u8>) -> bool {
    let graph = account_graph(&flags, &emails);
    let Outcome { passed, matches } = evaluate(&overlapping(), &graph).unwrap();

    let mut seen = HashSet::new();
    let unique = matches
        .iter()
        .all(|m| seen.insert((m.object.clone(), m.record_key.clone())));

    unique && (passed || matches.is_empty())
}

#[test]
fn test_duplicates_min_count() {
    let graph = AccountGraph::new(
        ACCOUNT_ID,
        GraphRecord {
            key: "Account:0".to_string(),
            record: Arc::new(Record::default()),
            link_sources: Vec::new(),
        },
        vec![(
            "Contact".to_string(),
            [("a", "x"), ("b", "x"), ("c", "y")]
                .into_iter()
                .map(|(key, value)| GraphRecord {
                    key: key.to_string(),
                    record: Arc::new(Record::from_value(json!({"k": value})).unwrap()),
                    link_sources: Vec::new(),
                })
                .collect(),
        )],
    );
    let duplicates = |min_count: usize| {
        alert(json!({"type": "aggregate", "operation": "DUPLICATES", "object": "Contact",
            "field": "k", "minCount": min_count}))
    };

    let outcome = evaluate(&duplicates(2), &graph).unwrap();
    assert!(outcome.passed);
    assert_eq!(
        outcome
            .matches
            .iter()
            .map(|m| m.record_key.as_str())
            .collect::<Vec<_>>(),
        vec!["a", "b"]
    );
    // Records without an Id have no record_id.
    assert!(outcome.matches.iter().all(|m| m.record_id.is_none()));

    assert_eq!(evaluate(&duplicates(3), &graph).unwrap(), Outcome::default());
}

#[test]
fn test_malformed_rule_is_an_error() {
    let graph = account_graph(&[true], &[]);
    let err = evaluate(
        &alert(json!({"type": "aggregate", "operation": "DUPLICATES", "object": "Case",
            "field": "Flagged", "minCount": 0})),
        &graph,
    )
    .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"aggregate over Case.Flagged has minCount 0, but it must be at least 2");
}

use super::{operator, FieldMatch, Match};
use graph::{AccountGraph, GraphRecord};
use indexmap::IndexMap;
use models::{Aggregate, Condition, Logic, Quantifier, RuleNode, Scope, ACCOUNT};
use serde_json::Value;
use std::collections::BTreeSet;

/// Context is the record currently in scope, against which
/// conditions over its entity type are tested.
#[derive(Clone, Copy)]
struct Context<'g> {
    graph: &'g AccountGraph,
    object: &'g str,
    record: &'g GraphRecord,
}

impl<'g> Context<'g> {
    fn with(&self, object: &'g str, record: &'g GraphRecord) -> Self {
        Self {
            graph: self.graph,
            object,
            record,
        }
    }
}

/// Evaluate a checked rule tree, with the account record as the initial context.
pub fn evaluate(node: &RuleNode, graph: &AccountGraph) -> (bool, Vec<Match>) {
    let ctx = Context {
        graph,
        object: ACCOUNT,
        record: graph.account(),
    };
    walk_node(ctx, node)
}

fn walk_node(ctx: Context, node: &RuleNode) -> (bool, Vec<Match>) {
    match node {
        RuleNode::Condition(condition) => walk_condition(ctx, condition),
        RuleNode::Group(group) => {
            let mut passed = group.logic == Logic::And;
            let mut matches = Vec::new();

            // Every child is evaluated, to surface each triggering field.
            for child in &group.children {
                let (child_passed, child_matches) = walk_node(ctx, child);

                match group.logic {
                    Logic::And => {
                        passed &= child_passed;
                        matches.extend(child_matches);
                    }
                    Logic::Or if child_passed => {
                        passed = true;
                        matches.extend(child_matches);
                    }
                    Logic::Or => {}
                }
            }
            if !passed {
                matches.clear();
            }
            (passed, matches)
        }
        RuleNode::Scope(scope) => walk_scope(ctx, scope),
        RuleNode::Aggregate(aggregate) => walk_aggregate(ctx, aggregate),
    }
}

fn walk_condition(ctx: Context, condition: &Condition) -> (bool, Vec<Match>) {
    if condition.object == ctx.object {
        let passed = test_condition(ctx.record, condition);
        let mut m = Match::new(ctx.object, ctx.record);
        m.matched_fields.push(field_match(ctx.record, condition, passed));
        return (passed, vec![m]);
    }

    // Outside of its own context, a condition holds if
    // any record of its entity type satisfies it.
    let matches: Vec<Match> = ctx
        .graph
        .records(&condition.object)
        .iter()
        .filter(|record| test_condition(record, condition))
        .map(|record| {
            let mut m = Match::new(&condition.object, record);
            m.matched_fields.push(field_match(record, condition, true));
            m
        })
        .collect();

    (!matches.is_empty(), matches)
}

fn walk_scope(ctx: Context, scope: &Scope) -> (bool, Vec<Match>) {
    let records = ctx.graph.records(&scope.object);

    let mut passing = Vec::new();
    let mut failing = Vec::new();

    for record in records {
        let ctx = ctx.with(&scope.object, record);

        let mut record_passed = true;
        let mut record_matches = Vec::new();

        for child in &scope.children {
            let (passed, matches) = walk_node(ctx, child);
            record_passed &= passed;
            record_matches.extend(matches);
        }

        if record_passed {
            passing.push(record_matches);
        } else {
            // A failing record is named even if none of its children matched.
            if !record_matches
                .iter()
                .any(|m| m.object == scope.object && m.record_key == record.key)
            {
                record_matches.insert(0, Match::new(&scope.object, record));
            }
            failing.push(record_matches);
        }
    }

    let (n, n_pass) = (records.len(), passing.len());

    let (passed, matches) = match scope.quantifier {
        Quantifier::Any => (n_pass != 0, passing),
        Quantifier::All => (n != 0 && n_pass == n, passing),
        Quantifier::None => (n_pass == 0, Vec::new()),
        Quantifier::NotAll => (n != 0 && n_pass != n, failing),
    };
    if !passed {
        return (false, Vec::new());
    }
    let mut matches: Vec<Match> = matches.into_iter().flatten().collect();

    // A passed scope without record-level matches is explained at the account.
    if matches.is_empty() {
        matches.push(summary(ctx.graph, scope, n, n_pass));
    }
    (passed, matches)
}

fn walk_aggregate(ctx: Context, aggregate: &Aggregate) -> (bool, Vec<Match>) {
    let Aggregate {
        operation: _,
        object,
        field,
        min_count,
        distinct_field,
        criteria,
    } = aggregate;

    // Group records satisfying the criteria on their value of `field`,
    // in order of first appearance. Blank values don't group.
    let mut groups: IndexMap<String, Vec<&GraphRecord>> = IndexMap::new();

    for record in ctx.graph.records(object) {
        if let Some(criteria) = criteria {
            if !walk_node(ctx.with(object, record), criteria).0 {
                continue;
            }
        }
        match record.record.text(field) {
            Some(value) if !value.trim().is_empty() => {
                groups.entry(value.into_owned()).or_default().push(record)
            }
            _ => continue,
        }
    }

    let mut matches = Vec::new();

    for (value, records) in groups {
        if records.len() < *min_count {
            continue;
        }
        if let Some(distinct_field) = distinct_field {
            let distinct: BTreeSet<String> = records
                .iter()
                .filter_map(|record| record.record.text(distinct_field))
                .filter(|text| !text.trim().is_empty())
                .map(|text| text.into_owned())
                .collect();

            if distinct.len() < 2 {
                continue;
            }
        }

        for record in records {
            let mut m = Match::new(object, record);
            m.matched_fields.push(FieldMatch {
                name: field.clone(),
                operator: "duplicates".to_string(),
                filter_value: None,
                actual_value: Value::String(value.clone()),
                matched: true,
            });
            if let Some(distinct_field) = distinct_field {
                m.matched_fields.push(FieldMatch {
                    name: distinct_field.clone(),
                    operator: "distinct".to_string(),
                    filter_value: None,
                    actual_value: actual_value(record, distinct_field),
                    matched: true,
                });
            }
            matches.push(m);
        }
    }

    (!matches.is_empty(), matches)
}

fn test_condition(record: &GraphRecord, condition: &Condition) -> bool {
    operator::test(
        condition.operator,
        record.record.get(&condition.field),
        condition.value.as_deref(),
    )
}

fn field_match(record: &GraphRecord, condition: &Condition, matched: bool) -> FieldMatch {
    FieldMatch {
        name: condition.field.clone(),
        operator: condition.operator.to_string(),
        filter_value: condition.value.clone(),
        actual_value: actual_value(record, &condition.field),
        matched,
    }
}

pub(crate) fn actual_value(record: &GraphRecord, field: &str) -> Value {
    record.record.get(field).cloned().unwrap_or(Value::Null)
}

// Account-level match which summarizes a scope's records.
fn summary(graph: &AccountGraph, scope: &Scope, n: usize, n_pass: usize) -> Match {
    let mut m = Match::new(ACCOUNT, graph.account());
    m.message = Some(format!(
        "{n_pass} of {n} {} records satisfy the conditions ({})",
        scope.object,
        scope.quantifier.as_str(),
    ));
    m
}

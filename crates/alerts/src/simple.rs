use super::{operator, tree::actual_value, FieldMatch, Match};
use graph::AccountGraph;
use indexmap::IndexMap;
use models::{Filter, FilterGroup};

/// Evaluate simple-mode filter groups. Filters are gathered by their object,
/// and every object must have at least one record which satisfies all of
/// its filters.
pub fn evaluate(groups: &[FilterGroup], graph: &AccountGraph) -> (bool, Vec<Match>) {
    let mut by_object: IndexMap<&str, Vec<&Filter>> = IndexMap::new();

    for group in groups {
        by_object
            .entry(group.object.as_str())
            .or_default()
            .extend(group.filters.iter());
    }

    let mut passed = !by_object.is_empty();
    let mut matches = Vec::new();

    for (object, filters) in by_object {
        let before = matches.len();

        for record in graph.records(object) {
            let satisfied = filters.iter().all(|filter| {
                operator::test(
                    filter.operator,
                    record.record.get(&filter.field),
                    filter.value.as_deref(),
                )
            });
            if !satisfied {
                continue;
            }

            let mut m = Match::new(object, record);
            m.matched_fields = filters
                .iter()
                .map(|filter| FieldMatch {
                    name: filter.field.clone(),
                    operator: filter.operator.to_string(),
                    filter_value: filter.value.clone(),
                    actual_value: actual_value(record, &filter.field),
                    matched: true,
                })
                .collect();
            matches.push(m);
        }

        if matches.len() == before {
            passed = false;
        }
    }

    (passed, matches)
}

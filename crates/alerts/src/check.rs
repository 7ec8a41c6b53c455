use super::Error;
use models::{AlertRule, Condition, Filter, RuleNode};

/// Check the structure of `rule` ahead of its evaluation.
/// Rules which were sanitized always pass.
pub fn check(rule: &AlertRule) -> Result<(), Error> {
    match rule {
        AlertRule::Simple(groups) if groups.is_empty() => Err(Error::EmptyRule),
        AlertRule::Simple(groups) => {
            for group in groups {
                for Filter {
                    field,
                    operator,
                    value,
                } in &group.filters
                {
                    check_value(&group.object, field, *operator, value.as_deref())?;
                }
            }
            Ok(())
        }
        AlertRule::Advanced(node) => check_node(node),
    }
}

fn check_node(node: &RuleNode) -> Result<(), Error> {
    match node {
        RuleNode::Condition(Condition {
            object,
            field,
            operator,
            value,
        }) => check_value(object, field, *operator, value.as_deref()),
        RuleNode::Group(group) => group.children.iter().try_for_each(check_node),
        RuleNode::Scope(scope) => {
            for child in &scope.children {
                match child {
                    RuleNode::Scope(nested) => {
                        return Err(Error::NestedScope {
                            object: scope.object.clone(),
                            nested: nested.object.clone(),
                        })
                    }
                    RuleNode::Aggregate(nested) => {
                        return Err(Error::AggregateInScope {
                            object: scope.object.clone(),
                            nested: nested.object.clone(),
                        })
                    }
                    _ => check_node(child)?,
                }
            }
            Ok(())
        }
        RuleNode::Aggregate(aggregate) => {
            if aggregate.min_count < 2 {
                return Err(Error::MinCount {
                    object: aggregate.object.clone(),
                    field: aggregate.field.clone(),
                    min_count: aggregate.min_count,
                });
            }
            match &aggregate.criteria {
                Some(criteria) => check_node(criteria),
                None => Ok(()),
            }
        }
    }
}

fn check_value(
    object: &str,
    field: &str,
    operator: models::Operator,
    value: Option<&str>,
) -> Result<(), Error> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ if !operator.requires_value() => Ok(()),
        _ => Err(Error::MissingValue {
            object: object.to_string(),
            field: field.to_string(),
            operator,
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn check_json(rule: serde_json::Value) -> Result<(), Error> {
        check(&serde_json::from_value(rule).unwrap())
    }

    #[test]
    fn test_malformed_rules() {
        let errors: Vec<String> = [
            json!([]),
            json!([{"object": "Case", "filters": [{"field": "Status", "operator": "equals"}]}]),
            json!({"type": "scope", "object": "Contact", "match": "ANY", "children": [
                {"type": "group", "logic": "OR", "children": [
                    {"type": "scope", "object": "Case", "match": "ALL", "children": []},
                ]},
                {"type": "scope", "object": "Case", "match": "ALL", "children": []},
            ]}),
            json!({"type": "scope", "object": "Contact", "match": "NONE", "children": [
                {"type": "aggregate", "operation": "DUPLICATES", "object": "Contact",
                    "field": "Email", "minCount": 2},
            ]}),
            json!({"type": "aggregate", "operation": "DUPLICATES", "object": "Contact",
                "field": "Email", "minCount": 1}),
            json!({"type": "aggregate", "operation": "DUPLICATES", "object": "Contact",
                "field": "Email", "minCount": 2, "criteria":
                    {"type": "condition", "object": "Contact", "field": "Email",
                        "operator": "contains", "value": " "}}),
        ]
        .into_iter()
        .map(|rule| check_json(rule).unwrap_err().to_string())
        .collect();

        insta::assert_debug_snapshot!(errors, @r###"
        [
            "alert has no filter groups",
            "operator equals of Case.Status requires a value",
            "scope over Contact cannot directly contain a scope over Case",
            "scope over Contact cannot directly contain an aggregate over Contact",
            "aggregate over Contact.Email has minCount 1, but it must be at least 2",
            "operator contains of Contact.Email requires a value",
        ]
        "###);

        // Scopes may nest through an intervening group.
        assert!(check_json(json!({"type": "scope", "object": "Contact", "match": "ANY", "children": [
            {"type": "group", "logic": "AND", "children": [
                {"type": "scope", "object": "Case", "match": "ALL", "children": []},
            ]},
        ]}))
        .is_ok());
        assert!(check_json(json!([{"object": "Case", "filters": [
            {"field": "Status", "operator": "blank"},
        ]}]))
        .is_ok());
    }
}

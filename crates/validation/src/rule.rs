use super::{Error, Location};
use models::{
    Aggregate, AggregateOp, Condition, Filter, FilterGroup, Group, Logic, Operator, Quantifier,
    RuleNode, Scope,
};
use serde_json::{Map, Value};

/// Walk simple-mode filter groups, returning those having at least one valid filter.
pub fn walk_filter_groups(
    location: Location,
    groups: &[Value],
    errors: &mut Vec<Error>,
) -> Vec<FilterGroup> {
    let mut out = Vec::new();

    for (index, group) in groups.iter().enumerate() {
        let location = location.push_item(index);

        let Some(group) = as_object(location, group, errors) else {
            continue;
        };
        let Some(object) = walk_name(location.push_prop("object"), "object", group, errors)
        else {
            continue;
        };
        let filters_location = location.push_prop("filters");
        let filters: &[Value] = match group.get("filters") {
            Some(Value::Array(filters)) => filters.as_slice(),
            _ => &[],
        };

        let filters: Vec<Filter> = filters
            .iter()
            .enumerate()
            .filter_map(|(index, filter)| {
                let location = filters_location.push_item(index);
                walk_filter(location, as_object(location, filter, errors)?, errors)
            })
            .collect();

        if filters.is_empty() {
            Error::NoChildren {
                location: location.to_string(),
                kind: "filter group",
            }
            .push(errors);
            continue;
        }
        out.push(FilterGroup { object, filters });
    }
    out
}

/// Walk a legacy flat list of filters which each name their object,
/// grouping them by object in order of first appearance.
pub fn walk_legacy_filters(
    location: Location,
    filters: &[Value],
    errors: &mut Vec<Error>,
) -> Vec<FilterGroup> {
    let mut out: Vec<FilterGroup> = Vec::new();

    for (index, filter) in filters.iter().enumerate() {
        let location = location.push_item(index);

        let Some(filter) = as_object(location, filter, errors) else {
            continue;
        };
        let Some(object) = walk_name(location.push_prop("object"), "object", filter, errors)
        else {
            continue;
        };
        let Some(filter) = walk_filter(location, filter, errors) else {
            continue;
        };

        match out.iter_mut().find(|group| group.object == object) {
            Some(group) => group.filters.push(filter),
            None => out.push(FilterGroup {
                object,
                filters: vec![filter],
            }),
        }
    }
    out
}

fn walk_filter(
    location: Location,
    filter: &Map<String, Value>,
    errors: &mut Vec<Error>,
) -> Option<Filter> {
    let field = walk_name(location.push_prop("field"), "field", filter, errors)?;
    let operator = walk_operator(location.push_prop("operator"), filter, errors)?;
    let value = walk_value(location.push_prop("value"), operator, filter, errors)?;

    Some(Filter {
        field,
        operator,
        value,
    })
}

/// Walk an advanced-mode rule node, returning None if it must be dropped.
pub fn walk_node(location: Location, node: &Value, errors: &mut Vec<Error>) -> Option<RuleNode> {
    let node = as_object(location, node, errors)?;

    let kind = match node.get("type") {
        Some(Value::String(kind)) => kind.trim().to_lowercase(),
        _ => infer_kind(node).to_string(),
    };

    match kind.as_str() {
        "condition" => walk_condition(location, node, errors).map(RuleNode::Condition),
        "group" => walk_group(location, node, errors).map(RuleNode::Group),
        "scope" => walk_scope(location, node, errors).map(RuleNode::Scope),
        "aggregate" => walk_aggregate(location, node, errors).map(RuleNode::Aggregate),
        _ => {
            Error::Unrecognized {
                location: location.push_prop("type").to_string(),
                what: "node type",
                value: kind,
            }
            .push(errors);
            None
        }
    }
}

// Infer the type of a node which doesn't declare one, from the properties it has.
fn infer_kind(node: &Map<String, Value>) -> &'static str {
    if node.contains_key("operation") || node.contains_key("minCount") {
        "aggregate"
    } else if node.contains_key("children") && node.contains_key("object") {
        "scope"
    } else if node.contains_key("children") {
        "group"
    } else {
        "condition"
    }
}

fn walk_condition(
    location: Location,
    node: &Map<String, Value>,
    errors: &mut Vec<Error>,
) -> Option<Condition> {
    let object = walk_name(location.push_prop("object"), "object", node, errors)?;
    let Filter {
        field,
        operator,
        value,
    } = walk_filter(location, node, errors)?;

    Some(Condition {
        object,
        field,
        operator,
        value,
    })
}

fn walk_group(
    location: Location,
    node: &Map<String, Value>,
    errors: &mut Vec<Error>,
) -> Option<Group> {
    let logic = match walk_keyword(location.push_prop("logic"), "logic", node, errors)?.as_deref() {
        None | Some("AND") => Logic::And,
        Some("OR") => Logic::Or,
        Some(other) => return unrecognized(location.push_prop("logic"), "logic", other, errors),
    };
    let children = walk_children(location, "group", node, errors, walk_node)?;

    Some(Group { logic, children })
}

fn walk_scope(
    location: Location,
    node: &Map<String, Value>,
    errors: &mut Vec<Error>,
) -> Option<Scope> {
    let object = walk_name(location.push_prop("object"), "object", node, errors)?;

    let quantifier = match walk_keyword(location.push_prop("match"), "quantifier", node, errors)?
        .as_deref()
    {
        None | Some("ANY") => Quantifier::Any,
        Some("ALL") => Quantifier::All,
        Some("NONE") => Quantifier::None,
        Some("NOT_ALL") => Quantifier::NotAll,
        Some(other) => {
            return unrecognized(location.push_prop("match"), "quantifier", other, errors)
        }
    };
    let children = walk_children(location, "scope", node, errors, |location, child, errors| {
        match walk_node(location, child, errors)? {
            node @ (RuleNode::Condition(_) | RuleNode::Group(_)) => Some(node),
            node => {
                Error::ScopeChild {
                    location: location.to_string(),
                    kind: node.kind(),
                }
                .push(errors);
                None
            }
        }
    })?;

    Some(Scope {
        object,
        quantifier,
        children,
    })
}

fn walk_aggregate(
    location: Location,
    node: &Map<String, Value>,
    errors: &mut Vec<Error>,
) -> Option<Aggregate> {
    let operation =
        match walk_keyword(location.push_prop("operation"), "operation", node, errors)?
            .as_deref()
        {
            None | Some("DUPLICATES") => AggregateOp::Duplicates,
            Some(other) => {
                return unrecognized(location.push_prop("operation"), "operation", other, errors)
            }
        };
    let object = walk_name(location.push_prop("object"), "object", node, errors)?;
    let field = walk_name(location.push_prop("field"), "field", node, errors)?;

    let min_count = match node.get("minCount") {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|n| n as usize)
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as usize))
            .unwrap_or(2),
        Some(Value::String(s)) => s.trim().parse::<usize>().unwrap_or(2),
        _ => 2,
    }
    .max(2);

    let distinct_field = match node.get("distinctField") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    // Invalid criteria would widen the aggregate to every record, so the
    // aggregate itself is dropped.
    let criteria = match node.get("criteria") {
        None | Some(Value::Null) => None,
        Some(criteria) => Some(Box::new(walk_node(
            location.push_prop("criteria"),
            criteria,
            errors,
        )?)),
    };

    Some(Aggregate {
        operation,
        object,
        field,
        min_count,
        distinct_field,
        criteria,
    })
}

fn walk_children<F>(
    location: Location,
    kind: &'static str,
    node: &Map<String, Value>,
    errors: &mut Vec<Error>,
    mut walk: F,
) -> Option<Vec<RuleNode>>
where
    F: FnMut(Location, &Value, &mut Vec<Error>) -> Option<RuleNode>,
{
    let children_location = location.push_prop("children");
    let children: &[Value] = match node.get("children") {
        Some(Value::Array(children)) => children.as_slice(),
        _ => &[],
    };

    let children: Vec<RuleNode> = children
        .iter()
        .enumerate()
        .filter_map(|(index, child)| walk(children_location.push_item(index), child, errors))
        .collect();

    if children.is_empty() {
        Error::NoChildren {
            location: location.to_string(),
            kind,
        }
        .push(errors);
        return None;
    }
    Some(children)
}

pub(crate) fn as_object<'v>(
    location: Location,
    value: &'v Value,
    errors: &mut Vec<Error>,
) -> Option<&'v Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => {
            Error::WrongShape {
                location: location.to_string(),
                expected: "an object",
            }
            .push(errors);
            None
        }
    }
}

/// Walk a required, non-empty name such as an object or field.
fn walk_name(
    location: Location,
    what: &'static str,
    node: &Map<String, Value>,
    errors: &mut Vec<Error>,
) -> Option<String> {
    match node.get(property(&location)) {
        Some(Value::String(name)) if !name.trim().is_empty() => Some(name.trim().to_string()),
        _ => {
            Error::NameEmpty {
                location: location.to_string(),
                what,
            }
            .push(errors);
            None
        }
    }
}

fn walk_operator(
    location: Location,
    node: &Map<String, Value>,
    errors: &mut Vec<Error>,
) -> Option<Operator> {
    let raw = match node.get(property(&location)) {
        Some(Value::String(raw)) => raw.as_str(),
        Some(other) => return unrecognized(location, "operator", &other.to_string(), errors),
        None => "",
    };
    match Operator::parse(raw) {
        Some(operator) => Some(operator),
        None => unrecognized(location, "operator", raw, errors),
    }
}

/// Walk the value of an operator. The outer Option is None if the filter
/// must be dropped, and the inner Option is the value to retain.
fn walk_value(
    location: Location,
    operator: Operator,
    node: &Map<String, Value>,
    errors: &mut Vec<Error>,
) -> Option<Option<String>> {
    if !operator.requires_value() {
        return Some(None);
    }
    match node.get(property(&location)) {
        Some(Value::String(value)) if !value.trim().is_empty() => Some(Some(value.clone())),
        _ => {
            Error::ValueRequired {
                location: location.to_string(),
                operator,
            }
            .push(errors);
            None
        }
    }
}

/// Walk an optional keyword, normalized to upper case with words joined by
/// underscores. The outer Option is None if the keyword isn't a string.
fn walk_keyword(
    location: Location,
    what: &'static str,
    node: &Map<String, Value>,
    errors: &mut Vec<Error>,
) -> Option<Option<String>> {
    match node.get(property(&location)) {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(raw)) if raw.trim().is_empty() => Some(None),
        Some(Value::String(raw)) => Some(Some(
            raw.trim()
                .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
                .filter(|word| !word.is_empty())
                .collect::<Vec<_>>()
                .join("_")
                .to_uppercase(),
        )),
        Some(other) => unrecognized(location, what, &other.to_string(), errors),
    }
}

fn unrecognized<T>(
    location: Location,
    what: &'static str,
    value: &str,
    errors: &mut Vec<Error>,
) -> Option<T> {
    Error::Unrecognized {
        location: location.to_string(),
        what,
        value: value.to_string(),
    }
    .push(errors);
    None
}

// The trailing property name of a Location.
fn property<'l>(location: &Location<'l>) -> &'l str {
    match location {
        Location::Property(_, name) => *name,
        _ => "",
    }
}

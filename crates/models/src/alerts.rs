use serde::{Deserialize, Serialize};

/// AlertDefinition is a sanitized, operator-authored rule which flags accounts
/// and the records responsible for triggering it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertDefinition {
    /// Unique identifier of the alert.
    pub id: String,
    /// Non-empty human-readable label.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub mode: AlertMode,
    pub rule: AlertRule,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    /// A conjunction of per-object filter groups.
    Simple,
    /// A single tree of rule nodes.
    Advanced,
}

/// AlertRule is the body of an alert, which must agree with its AlertMode.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum AlertRule {
    Simple(Vec<FilterGroup>),
    Advanced(RuleNode),
}

impl AlertRule {
    pub fn mode(&self) -> AlertMode {
        match self {
            AlertRule::Simple(_) => AlertMode::Simple,
            AlertRule::Advanced(_) => AlertMode::Advanced,
        }
    }
}

/// FilterGroup is the set of filters which a single record of `object` must
/// all satisfy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FilterGroup {
    pub object: String,
    pub filters: Vec<Filter>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// RuleNode is a node of an advanced alert's rule tree.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleNode {
    Condition(Condition),
    Group(Group),
    Scope(Scope),
    Aggregate(Aggregate),
}

/// Condition tests one field of one record of `object`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Condition {
    pub object: String,
    pub field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Group composes its children under boolean `logic`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Group {
    pub logic: Logic,
    pub children: Vec<RuleNode>,
}

/// Scope quantifies the truth of its children over every record of `object`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Scope {
    pub object: String,
    #[serde(rename = "match")]
    pub quantifier: Quantifier,
    pub children: Vec<RuleNode>,
}

/// Aggregate is a set-level test over the records of `object` which
/// satisfy its optional `criteria`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub operation: AggregateOp,
    pub object: String,
    pub field: String,
    pub min_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Box<RuleNode>>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Logic {
    And,
    Or,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quantifier {
    Any,
    All,
    None,
    NotAll,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregateOp {
    Duplicates,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EqualsIgnoreCase,
    Blank,
    NotBlank,
    Null,
    NotNull,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Contains,
        Operator::NotContains,
        Operator::StartsWith,
        Operator::EqualsIgnoreCase,
        Operator::Blank,
        Operator::NotBlank,
        Operator::Null,
        Operator::NotNull,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::StartsWith => "starts_with",
            Operator::EqualsIgnoreCase => "equals_ignore_case",
            Operator::Blank => "blank",
            Operator::NotBlank => "not_blank",
            Operator::Null => "null",
            Operator::NotNull => "not_null",
        }
    }

    /// Parse an operator name, ignoring case and surrounding whitespace.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(name))
    }

    /// Does this operator compare against an operator-supplied value?
    pub fn requires_value(&self) -> bool {
        !matches!(
            self,
            Operator::Blank | Operator::NotBlank | Operator::Null | Operator::NotNull
        )
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Quantifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quantifier::Any => "ANY",
            Quantifier::All => "ALL",
            Quantifier::None => "NONE",
            Quantifier::NotAll => "NOT_ALL",
        }
    }
}

impl RuleNode {
    /// Short name of the node's variant, as used by its `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleNode::Condition(_) => "condition",
            RuleNode::Group(_) => "group",
            RuleNode::Scope(_) => "scope",
            RuleNode::Aggregate(_) => "aggregate",
        }
    }
}

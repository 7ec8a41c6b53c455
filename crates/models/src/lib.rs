mod account_ids;
mod alerts;
mod config;
mod record;
mod registry;

pub use account_ids::{parse_account_ids, sanitize_account_ids, MAX_ACCOUNT_IDS};
pub use alerts::{
    Aggregate, AggregateOp, AlertDefinition, AlertMode, AlertRule, Condition, Filter,
    FilterGroup, Group, Logic, Operator, Quantifier, RuleNode, Scope,
};
pub use config::{ConfigError, ExplorerConfig, ObjectVisibility, MAX_FIELDS_PER_OBJECT};
pub use record::{stringify, Record};
pub use registry::{
    Link, LinkPath, LinkSource, ObjectDef, Registry, RegistryError, ACCOUNT, CONTACT, INDIVIDUAL,
};

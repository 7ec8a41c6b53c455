use indexmap::IndexMap;
use models::{LinkSource, Record, ACCOUNT};
use std::sync::Arc;

mod pool;
mod resolver;

pub use pool::{Pool, Pools};
pub use resolver::Resolver;

/// GraphRecord is a record of an AccountGraph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRecord {
    /// Stable key of the record within its entity type and run.
    pub key: String,
    pub record: Arc<Record>,
    /// Paths through which a contact point was reached from the account.
    /// Empty for other entity types.
    pub link_sources: Vec<LinkSource>,
}

impl GraphRecord {
    /// Remote identifier of the record, if it has one.
    pub fn id(&self) -> Option<&str> {
        self.record.id()
    }
}

/// AccountGraph is the set of records related to one account, keyed on
/// entity type. It always has exactly one Account record, which is
/// empty if the account wasn't found.
#[derive(Debug, Clone)]
pub struct AccountGraph {
    pub account_id: String,
    objects: IndexMap<String, Vec<GraphRecord>>,
}

impl AccountGraph {
    /// Build an AccountGraph of `account` and its related records.
    pub fn new(
        account_id: impl Into<String>,
        account: GraphRecord,
        related: impl IntoIterator<Item = (String, Vec<GraphRecord>)>,
    ) -> Self {
        let mut objects = IndexMap::new();
        objects.insert(ACCOUNT.to_string(), vec![account]);

        for (object, records) in related {
            if object != ACCOUNT {
                objects.insert(object, records);
            }
        }
        Self {
            account_id: account_id.into(),
            objects,
        }
    }

    /// The account record itself.
    pub fn account(&self) -> &GraphRecord {
        &self.objects[ACCOUNT][0]
    }

    /// Records of entity type `object`, or an empty slice if it has none.
    pub fn records(&self, object: &str) -> &[GraphRecord] {
        self.objects
            .get(object)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Entity types and their records, Account first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[GraphRecord])> {
        self.objects
            .iter()
            .map(|(object, records)| (object.as_str(), records.as_slice()))
    }
}

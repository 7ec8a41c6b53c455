use super::{AccountGraph, GraphRecord, Pool, Pools};
use fetcher::Fetched;
use models::{Link, LinkPath, LinkSource, ObjectDef, Record, Registry, ACCOUNT, CONTACT, INDIVIDUAL};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Resolver assembles per-account graphs from the flat, per-type pools of
/// fetched records. Indices are built once and shared by every account.
pub struct Resolver {
    pools: Pools,
    objects: Vec<Resolve>,
    // Account contacts, and the contacts' referenced individuals.
    contacts_by_account: HashMap<String, Vec<usize>>,
    individual_field: Option<String>,
    empty: Pool,
}

// How the records of one entity type are resolved for an account.
enum Resolve {
    // Records indexed on their account-reference field.
    Direct {
        object: String,
        by_account: HashMap<String, Vec<usize>>,
    },
    // Records referenced by `field` of the account's contacts.
    ContactReference { object: String, field: String },
    // Records indexed on the link field of each active path.
    ContactPoint {
        object: String,
        paths: Vec<(LinkSource, HashMap<String, Vec<usize>>)>,
    },
}

impl Resolver {
    pub fn new(registry: &Registry, fetched: Fetched) -> Self {
        let Fetched {
            records,
            link_sources,
            ..
        } = fetched;
        let pools = Pools::new(records);
        let empty = Pool::default();

        let objects: Vec<Resolve> = registry
            .linked()
            .filter_map(|ObjectDef { name, link, .. }| {
                let pool = pools.get(name).unwrap_or(&empty);

                Some(match link {
                    Link::Root => return None,
                    Link::Direct { field } => Resolve::Direct {
                        object: name.clone(),
                        by_account: pool.index_by(field),
                    },
                    Link::ContactReference { field } => Resolve::ContactReference {
                        object: name.clone(),
                        field: field.clone(),
                    },
                    Link::ContactPoint { .. } => Resolve::ContactPoint {
                        object: name.clone(),
                        paths: link_sources
                            .get(name)
                            .into_iter()
                            .flatten()
                            .map(|source| (source.clone(), pool.index_by(&source.field)))
                            .collect(),
                    },
                })
            })
            .collect();

        let contacts_by_account = match registry.get(CONTACT) {
            Some(ObjectDef {
                link: Link::Direct { field },
                ..
            }) => pools.get(CONTACT).unwrap_or(&empty).index_by(field),
            _ => HashMap::new(),
        };
        let individual_field = match registry.get(INDIVIDUAL) {
            Some(ObjectDef {
                link: Link::ContactReference { field },
                ..
            }) => Some(field.clone()),
            _ => None,
        };

        Self {
            pools,
            objects,
            contacts_by_account,
            individual_field,
            empty,
        }
    }

    pub fn pools(&self) -> &Pools {
        &self.pools
    }

    /// Assemble the AccountGraph of `account_id`. Only records reachable
    /// from the account are included.
    pub fn resolve(&self, account_id: &str) -> AccountGraph {
        let account = match self.pool(ACCOUNT).find(account_id) {
            Some(index) => self.graph_record(ACCOUNT, index, Vec::new()),
            None => GraphRecord {
                key: format!("{ACCOUNT}:0"),
                record: Arc::new(Record::default()),
                link_sources: Vec::new(),
            },
        };

        let contacts: &[usize] = self
            .contacts_by_account
            .get(account_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let contact_pool = self.pool(CONTACT);

        let contact_ids: BTreeSet<&str> = contacts
            .iter()
            .filter_map(|index| contact_pool.get(*index).1.id())
            .collect();
        let individual_ids: BTreeSet<String> = match &self.individual_field {
            Some(field) => self.referenced(contacts, field),
            None => BTreeSet::new(),
        };

        let related = self.objects.iter().map(|resolve| match resolve {
            Resolve::Direct { object, by_account } => {
                let indices = by_account.get(account_id).into_iter().flatten();
                let records: Vec<GraphRecord> = indices
                    .map(|index| self.graph_record(object, *index, Vec::new()))
                    .collect();
                (object.clone(), records)
            }
            Resolve::ContactReference { object, field } => {
                let pool = self.pool(object);
                let indices: BTreeSet<usize> = self
                    .referenced(contacts, field)
                    .iter()
                    .filter_map(|id| pool.find(id))
                    .collect();
                let records: Vec<GraphRecord> = indices
                    .into_iter()
                    .map(|index| self.graph_record(object, index, Vec::new()))
                    .collect();
                (object.clone(), records)
            }
            Resolve::ContactPoint { object, paths } => {
                // Provenance of each reached record, in pool order.
                let mut reached: BTreeMap<usize, Vec<LinkSource>> = BTreeMap::new();

                for (source, index) in paths {
                    let owners: Vec<&str> = match source.path {
                        LinkPath::Contact => contact_ids.iter().copied().collect(),
                        LinkPath::Individual => {
                            individual_ids.iter().map(String::as_str).collect()
                        }
                    };
                    for owner in owners {
                        for offset in index.get(owner).into_iter().flatten() {
                            let sources = reached.entry(*offset).or_default();
                            if !sources.contains(source) {
                                sources.push(source.clone());
                            }
                        }
                    }
                }
                let records: Vec<GraphRecord> = reached
                    .into_iter()
                    .map(|(index, sources)| self.graph_record(object, index, sources))
                    .collect();
                (object.clone(), records)
            }
        });

        let graph = AccountGraph::new(account_id, account, related);
        tracing::trace!(account_id, "resolved account graph");
        graph
    }

    fn pool(&self, object: &str) -> &Pool {
        self.pools.get(object).unwrap_or(&self.empty)
    }

    // Distinct, non-empty values of `field` across `contacts`.
    fn referenced(&self, contacts: &[usize], field: &str) -> BTreeSet<String> {
        let pool = self.pool(CONTACT);

        contacts
            .iter()
            .filter_map(|index| pool.get(*index).1.text(field))
            .filter(|value| !value.is_empty())
            .map(|value| value.into_owned())
            .collect()
    }

    fn graph_record(
        &self,
        object: &str,
        index: usize,
        link_sources: Vec<LinkSource>,
    ) -> GraphRecord {
        let (key, record) = self.pool(object).get(index);

        GraphRecord {
            key: key.to_string(),
            record: record.clone(),
            link_sources,
        }
    }
}

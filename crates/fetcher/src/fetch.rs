use super::{FieldCache, ObjectPlan, RecordStore, StoreError, Warnings};
use futures::future::try_join_all;
use models::{
    ExplorerConfig, Link, LinkPath, LinkSource, ObjectDef, Record, ACCOUNT, CONTACT, INDIVIDUAL,
};
use std::collections::{BTreeMap, BTreeSet};

/// Maximum number of identifiers in a single batch query of the remote store.
pub const CHUNK_SIZE: usize = 100;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to fetch required entity type {object}")]
    Required {
        object: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to fetch entity type {object}")]
    Store {
        object: String,
        #[source]
        source: StoreError,
    },
}

/// Fetched is the outcome of fetching all entity types for a set of accounts.
#[derive(Debug, Default)]
pub struct Fetched {
    /// Requested account identifiers.
    pub account_ids: Vec<String>,
    /// Requested account identifiers which the remote store didn't return.
    pub missing_account_ids: Vec<String>,
    /// Pools of fetched records, keyed on entity type.
    /// Degraded types have an empty pool.
    pub records: BTreeMap<String, Vec<Record>>,
    /// Query plans of the types which were successfully described.
    pub plans: BTreeMap<String, ObjectPlan>,
    /// Active link paths of each contact point type, and their fields.
    pub link_sources: BTreeMap<String, Vec<LinkSource>>,
    /// Warnings of degraded entity types.
    pub warnings: BTreeMap<String, String>,
}

/// Fetch the records of every registry entity type which relate to `account_ids`.
///
/// Types are fetched in dependency order: accounts, then types linked directly
/// to accounts, then types referenced by contacts, then contact points.
/// Types within a stage are fetched concurrently, while the chunks of a single
/// type are queried sequentially so that a degraded type stops early.
#[tracing::instrument(skip_all, err, fields(accounts = account_ids.len()))]
pub async fn fetch(
    store: &dyn RecordStore,
    cache: &FieldCache,
    config: &ExplorerConfig,
    account_ids: &[String],
) -> Result<Fetched, Error> {
    let fetcher = Fetcher {
        store,
        cache,
        config,
        warnings: Warnings::new(),
    };
    let registry = config.registry();

    let mut plans = BTreeMap::new();
    let mut records = BTreeMap::new();
    let mut link_sources = BTreeMap::new();

    // Accounts are required, and every failure is fatal.
    let (plan, accounts) = fetcher
        .fetch_type(ACCOUNT, Record::ID, account_ids, true)
        .await?;

    let found: BTreeSet<&str> = accounts.iter().filter_map(Record::id).collect();
    let missing_account_ids: Vec<String> = account_ids
        .iter()
        .filter(|id| !found.contains(id.as_str()))
        .cloned()
        .collect();

    plans.extend(plan.map(|plan| (ACCOUNT.to_string(), plan)));
    records.insert(ACCOUNT.to_string(), accounts);

    // Types linked directly to accounts.
    let direct = try_join_all(registry.linked().filter_map(|def| match &def.link {
        Link::Direct { field } => {
            Some(fetcher.fetch_named(&def.name, field, account_ids.to_vec()))
        }
        _ => None,
    }))
    .await?;
    insert_all(direct, &mut plans, &mut records);

    // Types referenced by contacts, selected by identifier.
    let contacts = records.get(CONTACT).map(Vec::as_slice).unwrap_or_default();

    let referenced = try_join_all(registry.linked().filter_map(|def| match &def.link {
        Link::ContactReference { field } => Some(fetcher.fetch_named(
            &def.name,
            Record::ID,
            distinct_values(contacts, field),
        )),
        _ => None,
    }))
    .await?;
    insert_all(referenced, &mut plans, &mut records);

    // Contact points, reached through contacts and/or individuals.
    let contacts = records.get(CONTACT).map(Vec::as_slice).unwrap_or_default();
    let contact_ids = distinct_values(contacts, Record::ID);
    let individual_ids = match registry.get(INDIVIDUAL) {
        Some(ObjectDef {
            link: Link::ContactReference { field },
            ..
        }) => distinct_values(contacts, field),
        _ => Vec::new(),
    };

    let contact_points = try_join_all(registry.linked().filter_map(|def| match &def.link {
        Link::ContactPoint {
            contact_field,
            individual_field,
        } => Some(fetcher.fetch_contact_point(
            def,
            contact_field.as_deref(),
            individual_field.as_deref(),
            &contact_ids,
            &individual_ids,
        )),
        _ => None,
    }))
    .await?;

    for (object, plan, sources, pool) in contact_points {
        plans.extend(plan.map(|plan| (object.clone(), plan)));
        link_sources.insert(object.clone(), sources);
        records.insert(object, pool);
    }

    let warnings = fetcher.warnings.into_inner();

    tracing::info!(
        accounts = account_ids.len(),
        missing = missing_account_ids.len(),
        degraded = warnings.len(),
        "fetched related records"
    );

    Ok(Fetched {
        account_ids: account_ids.to_vec(),
        missing_account_ids,
        records,
        plans,
        link_sources,
        warnings,
    })
}

struct Fetcher<'a> {
    store: &'a dyn RecordStore,
    cache: &'a FieldCache,
    config: &'a ExplorerConfig,
    warnings: Warnings,
}

impl<'a> Fetcher<'a> {
    async fn fetch_named(
        &self,
        object: &'a str,
        id_field: &'a str,
        ids: Vec<String>,
    ) -> Result<(String, Option<ObjectPlan>, Vec<Record>), Error> {
        let (plan, records) = self.fetch_type(object, id_field, &ids, false).await?;
        Ok((object.to_string(), plan, records))
    }

    /// Describe and then query `object` for records having an `id_field` among `ids`.
    async fn fetch_type(
        &self,
        object: &str,
        id_field: &str,
        ids: &[String],
        required: bool,
    ) -> Result<(Option<ObjectPlan>, Vec<Record>), Error> {
        let Some(plan) = self.plan(object, required).await? else {
            return Ok((None, Vec::new()));
        };
        let records = self
            .query(object, &plan.query_fields, id_field, ids, required)
            .await?
            .unwrap_or_default();

        Ok((Some(plan), records))
    }

    async fn fetch_contact_point(
        &self,
        def: &ObjectDef,
        contact_field: Option<&str>,
        individual_field: Option<&str>,
        contact_ids: &[String],
        individual_ids: &[String],
    ) -> Result<(String, Option<ObjectPlan>, Vec<LinkSource>, Vec<Record>), Error> {
        let object = def.name.as_str();

        let Some(plan) = self.plan(object, false).await? else {
            return Ok((object.to_string(), None, Vec::new(), Vec::new()));
        };

        // Paths are active if enabled by configuration, and their link field exists.
        let sources: Vec<LinkSource> = self
            .config
            .link_paths(object)
            .into_iter()
            .filter_map(|path| {
                let field = match path {
                    LinkPath::Contact => contact_field?,
                    LinkPath::Individual => individual_field?,
                };
                if !plan.has_field(field) {
                    tracing::debug!(object, field, path = path.as_str(), "link path field is unavailable");
                    return None;
                }
                Some(LinkSource {
                    path,
                    field: field.to_string(),
                })
            })
            .collect();

        let mut pool: Vec<Record> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();

        for LinkSource { path, field } in &sources {
            let ids = match path {
                LinkPath::Contact => contact_ids,
                LinkPath::Individual => individual_ids,
            };
            let Some(records) = self
                .query(object, &plan.query_fields, field, ids, false)
                .await?
            else {
                // A degraded type is empty, even if another path succeeded.
                pool.clear();
                break;
            };

            // Records reached through more than one path are fetched once.
            for record in records {
                let repeated = match record.id() {
                    Some(id) => !seen.insert(id.to_string()),
                    None => false,
                };
                if !repeated {
                    pool.push(record);
                }
            }
        }

        Ok((object.to_string(), Some(plan), sources, pool))
    }

    /// Describe `object` into an ObjectPlan. Returns None if the type is degraded.
    async fn plan(&self, object: &str, required: bool) -> Result<Option<ObjectPlan>, Error> {
        match self.cache.fields(self.store, object).await {
            Ok(available) => Ok(Some(ObjectPlan::new(self.config, object, available))),
            Err(err) => self.degrade(object, err, required).map(|()| None),
        }
    }

    /// Query `fields` of `object` in chunks of `ids`.
    /// Returns None if the type is degraded.
    async fn query(
        &self,
        object: &str,
        fields: &[String],
        id_field: &str,
        ids: &[String],
        required: bool,
    ) -> Result<Option<Vec<Record>>, Error> {
        let mut out = Vec::new();

        for chunk in ids.chunks(CHUNK_SIZE) {
            if self.warnings.contains(object) {
                return Ok(None);
            }
            match self.store.batch_query(object, fields, id_field, chunk).await {
                Ok(records) => out.extend(records),
                Err(err) => return self.degrade(object, err, required).map(|()| None),
            }
        }
        tracing::debug!(object, id_field, records = out.len(), "queried entity type");

        Ok(Some(out))
    }

    /// Degrade `object` to an empty type if `err` is recoverable,
    /// or else return the fatal error of the run.
    fn degrade(&self, object: &str, err: StoreError, required: bool) -> Result<(), Error> {
        if required {
            return Err(Error::Required {
                object: object.to_string(),
                source: err,
            });
        } else if !err.is_recoverable() {
            return Err(Error::Store {
                object: object.to_string(),
                source: err,
            });
        }

        let label = self.config.registry().label(object);
        if self.warnings.insert(object, err.warning(label)) {
            tracing::warn!(object, error = %err, "skipping entity type due to remote store error");
        }
        Ok(())
    }
}

fn insert_all(
    fetched: Vec<(String, Option<ObjectPlan>, Vec<Record>)>,
    plans: &mut BTreeMap<String, ObjectPlan>,
    records: &mut BTreeMap<String, Vec<Record>>,
) {
    for (object, plan, pool) in fetched {
        plans.extend(plan.map(|plan| (object.clone(), plan)));
        records.insert(object, pool);
    }
}

// Distinct, non-empty values of `field` across `records`, in order of first appearance.
fn distinct_values(records: &[Record], field: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();

    records
        .iter()
        .filter_map(|record| record.text(field))
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.to_string()))
        .map(|value| value.into_owned())
        .collect()
}

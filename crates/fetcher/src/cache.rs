use super::{RecordStore, StoreError};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// FieldCache holds the field names of remote entity types, keyed on
/// (organization, entity type). It's shared across concurrent fetches
/// and across runs. The lock is never held across an await point.
#[derive(Debug, Default)]
pub struct FieldCache(Mutex<HashMap<(String, String), Arc<BTreeSet<String>>>>);

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields of `object`, described through `store` if not already cached.
    /// Failed describe calls are not cached.
    pub async fn fields(
        &self,
        store: &dyn RecordStore,
        object: &str,
    ) -> Result<Arc<BTreeSet<String>>, StoreError> {
        let key = (store.org_id().to_string(), object.to_string());

        let cached = self.lock().get(&key).cloned();
        if let Some(fields) = cached {
            return Ok(fields);
        }

        let fields = Arc::new(store.describe(object).await?);
        tracing::debug!(object, fields = fields.len(), "described entity type");

        self.lock().insert(key, fields.clone());
        Ok(fields)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(String, String), Arc<BTreeSet<String>>>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

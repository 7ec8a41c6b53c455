use models::Record;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Pool is an arena of the fetched records of one entity type.
/// Records are addressed by their index within the arena.
#[derive(Debug, Default)]
pub struct Pool {
    records: Vec<Arc<Record>>,
    keys: Vec<String>,
    by_id: HashMap<String, usize>,
}

impl Pool {
    pub fn new(object: &str, records: Vec<Record>) -> Self {
        let mut pool = Pool::default();

        for (index, record) in records.into_iter().enumerate() {
            let key = match record.id() {
                Some(id) => {
                    pool.by_id.entry(id.to_string()).or_insert(index);
                    id.to_string()
                }
                None => format!("{object}:{index}"),
            };
            pool.keys.push(key);
            pool.records.push(Arc::new(record));
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> (&str, &Arc<Record>) {
        (&self.keys[index], &self.records[index])
    }

    /// Index of the record having identifier `id`.
    pub fn find(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Index the records of this pool on the stringified value of `field`.
    /// Records having a null or empty value aren't indexed.
    pub fn index_by(&self, field: &str) -> HashMap<String, Vec<usize>> {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();

        for (offset, record) in self.records.iter().enumerate() {
            match record.text(field) {
                Some(value) if !value.is_empty() => {
                    index.entry(value.into_owned()).or_default().push(offset)
                }
                _ => {}
            }
        }
        index
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Record>)> {
        self.keys.iter().map(String::as_str).zip(self.records.iter())
    }
}

/// Pools are the record arenas of every fetched entity type.
#[derive(Debug, Default)]
pub struct Pools(BTreeMap<String, Pool>);

impl Pools {
    pub fn new(records: BTreeMap<String, Vec<Record>>) -> Self {
        Self(
            records
                .into_iter()
                .map(|(object, records)| {
                    let pool = Pool::new(&object, records);
                    (object, pool)
                })
                .collect(),
        )
    }

    pub fn get(&self, object: &str) -> Option<&Pool> {
        self.0.get(object)
    }

    /// Number of records fetched for `object`.
    pub fn count(&self, object: &str) -> usize {
        self.0.get(object).map(Pool::len).unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pool_keys_and_indices() {
        let records = vec![
            json!({"Id": "500000000000001AAA", "Status": "New"}),
            json!({"Status": "New"}),
            json!({"Id": "500000000000002AAA", "Status": null}),
            json!({"Id": "500000000000003AAA", "Status": ""}),
        ]
        .into_iter()
        .filter_map(Record::from_value)
        .collect();

        let pool = Pool::new("Case", records);

        assert_eq!(
            pool.iter().map(|(key, _)| key).collect::<Vec<_>>(),
            vec![
                "500000000000001AAA",
                "Case:1",
                "500000000000002AAA",
                "500000000000003AAA"
            ]
        );
        assert_eq!(pool.find("500000000000002AAA"), Some(2));
        assert_eq!(pool.find("Case:1"), None);

        let index = pool.index_by("Status");
        assert_eq!(index.len(), 1);
        assert_eq!(index["New"], vec![0, 1]);
    }
}

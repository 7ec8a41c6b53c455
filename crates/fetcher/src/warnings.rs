use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Warnings accumulates human-readable warnings keyed on entity type (or on
/// alert), under concurrent writers. The first warning of a key wins.
#[derive(Debug, Default)]
pub struct Warnings(Mutex<BTreeMap<String, String>>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `message` under `key` if it doesn't already have a warning.
    /// Returns true if the message was inserted.
    pub fn insert(&self, key: &str, message: String) -> bool {
        let mut warnings = self.lock();

        if warnings.contains_key(key) {
            return false;
        }
        warnings.insert(key.to_string(), message);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<BTreeMap<String, String>> for Warnings {
    fn from(warnings: BTreeMap<String, String>) -> Self {
        Self(Mutex::new(warnings))
    }
}

#[cfg(test)]
mod test {
    use super::Warnings;

    #[test]
    fn test_first_warning_wins() {
        let warnings = Warnings::new();

        assert!(warnings.insert("Case", "Case: first".to_string()));
        assert!(!warnings.insert("Case", "Case: second".to_string()));
        assert!(warnings.insert("alert:dup", "boom".to_string()));
        assert!(warnings.contains("Case"));
        assert!(!warnings.contains("Order"));

        let warnings = warnings.into_inner();
        assert_eq!(warnings["Case"], "Case: first");
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_concurrent_writers() {
        let warnings = Warnings::new();

        let inserted: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|writer| {
                    let warnings = &warnings;
                    scope.spawn(move || warnings.insert("Case", format!("Case: writer {writer}")))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        assert_eq!(inserted.iter().filter(|ok| **ok).count(), 1);

        // The winning writer's message is the one retained.
        let winner = inserted.iter().position(|ok| *ok).unwrap();
        assert_eq!(
            warnings.into_inner()["Case"],
            format!("Case: writer {winner}")
        );
    }
}

// Key-value medium abstraction and the in-memory implementation

use crate::error::{StoreError, StoreResult};
use std::collections::HashMap;
use tracing::debug;

/// Synchronous string-keyed storage that a [`KeyValueStore`](crate::KeyValueStore) sits on
///
/// Implementations decide how long values live and how much they can hold.
/// A write that the medium cannot accept must fail without changing the
/// previously stored value.
pub trait Medium {
    /// Raw value stored under `key`, or `None` if the key is absent
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`; absent keys are not an error
    fn remove_item(&mut self, key: &str) -> StoreResult<()>;

    /// All keys currently stored, sorted
    fn keys(&self) -> StoreResult<Vec<String>>;
}

impl<M: Medium + ?Sized> Medium for Box<M> {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        (**self).keys()
    }
}

/// Process-local medium backed by a `HashMap`
///
/// Nothing outlives the value. An optional quota bounds the total size of
/// keys plus values in bytes, the way browser storage does.
#[derive(Debug, Default, Clone)]
pub struct MemoryMedium {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit total stored bytes (keys plus values)
    pub fn with_quota(mut self, limit: usize) -> Self {
        self.quota = Some(limit);
        self
    }

    /// Bytes currently used (keys plus values)
    pub fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Medium for MemoryMedium {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(limit) = self.quota {
            let replaced = self.items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        debug!(key, bytes = value.len(), "MemoryMedium::set_item");
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys: Vec<String> = self.items.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_get_missing() {
        let medium = MemoryMedium::new();
        assert_eq!(medium.get_item("nope").unwrap(), None);
        assert!(medium.is_empty());
    }

    #[test]
    fn test_memory_set_get_remove() {
        let mut medium = MemoryMedium::new();
        medium.set_item("a", "1").unwrap();
        medium.set_item("a", "2").unwrap();
        assert_eq!(medium.get_item("a").unwrap().as_deref(), Some("2"));
        assert_eq!(medium.len(), 1);

        medium.remove_item("a").unwrap();
        assert_eq!(medium.get_item("a").unwrap(), None);

        // Removing again is a no-op
        medium.remove_item("a").unwrap();
    }

    #[test]
    fn test_memory_keys_sorted() {
        let mut medium = MemoryMedium::new();
        medium.set_item("b", "x").unwrap();
        medium.set_item("a", "y").unwrap();
        assert_eq!(medium.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_memory_quota_rejects_and_keeps_old_value() {
        let mut medium = MemoryMedium::new().with_quota(10);
        medium.set_item("k", "12345").unwrap();
        assert_eq!(medium.used_bytes(), 6);

        let err = medium.set_item("k", "0123456789").unwrap_err();
        match err {
            StoreError::QuotaExceeded { needed, limit, .. } => {
                assert_eq!(needed, 11);
                assert_eq!(limit, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(medium.get_item("k").unwrap().as_deref(), Some("12345"));

        // Replacing with something that fits is fine
        medium.set_item("k", "123456789").unwrap();
    }
}

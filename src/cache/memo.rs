use parking_lot::RwLock;
use std::collections::HashMap;

use super::PersistentCache;
use crate::error::ResolverResult;

/// Simple thread-safe in-memory cache.
///
/// Survives only as long as the process, but shares the key format and
/// semantics of the durable stores, which makes it the default in tests.
pub struct MemoryCache {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a cache with existing entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: RwLock::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) {
        let mut map = self.inner.write();
        map.clear();
    }
}

impl PersistentCache for MemoryCache {
    fn get(&self, key: &str) -> ResolverResult<Option<String>> {
        let map = self.inner.read();
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ResolverResult<()> {
        let mut map = self.inner.write();
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ResolverResult<()> {
        let mut map = self.inner.write();
        map.remove(key);
        Ok(())
    }

    fn keys(&self) -> ResolverResult<Vec<String>> {
        let map = self.inner.read();
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_silently() {
        let cache = MemoryCache::new();
        cache.set("hsjson-build-7", "[1]").unwrap();
        cache.set("hsjson-build-7", "[2]").unwrap();
        assert_eq!(cache.get("hsjson-build-7").unwrap().as_deref(), Some("[2]"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn remove_missing_key_is_noop() {
        let cache = MemoryCache::with_entries([("a", "1")]);
        cache.remove("b").unwrap();
        cache.remove("a").unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_are_sorted() {
        let cache = MemoryCache::with_entries([("b", "1"), ("a", "2")]);
        assert_eq!(cache.keys().unwrap(), vec!["a", "b"]);
    }
}

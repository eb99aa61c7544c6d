use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

/// Bounded least-recently-used memo for derived text (summaries), keyed by a
/// SHA-256 of the source content and the derivation parameter.
#[derive(Clone, Debug)]
pub struct SummaryCache {
    capacity: usize,
    inner: Arc<Mutex<Lru>>,
}

#[derive(Debug, Default)]
struct Lru {
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

impl Lru {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

pub fn cache_key(content: &str, param: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update([0u8]);
    hasher.update(param.as_bytes());
    hex::encode(hasher.finalize())
}

impl SummaryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Arc::new(Mutex::new(Lru::default())),
        }
    }

    pub fn get(&self, content: &str, param: &str) -> Option<String> {
        let key = cache_key(content, param);
        let mut lru = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let value = lru.entries.get(&key).cloned()?;
        lru.touch(&key);
        Some(value)
    }

    pub fn insert(&self, content: &str, param: &str, value: String) {
        if self.capacity == 0 {
            return;
        }
        let key = cache_key(content, param);
        let mut lru = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if lru.entries.insert(key.clone(), value).is_some() {
            lru.touch(&key);
            return;
        }
        lru.order.push_back(key);

        while lru.order.len() > self.capacity {
            if let Some(evicted) = lru.order.pop_front() {
                lru.entries.remove(&evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_depends_on_content_and_param() {
        assert_eq!(cache_key("abc", "5"), cache_key("abc", "5"));
        assert_ne!(cache_key("abc", "5"), cache_key("abc", "3"));
        assert_ne!(cache_key("ab", "c5"), cache_key("abc", "5"));
        assert_eq!(cache_key("x", "y").len(), 64);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = SummaryCache::new(2);
        cache.insert("a", "5", "A".into());
        cache.insert("b", "5", "B".into());
        assert_eq!(cache.get("a", "5").as_deref(), Some("A"));

        cache.insert("c", "5", "C".into());
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b", "5").is_none());
        assert_eq!(cache.get("a", "5").as_deref(), Some("A"));
        assert_eq!(cache.get("c", "5").as_deref(), Some("C"));
    }

    #[test]
    fn reinserting_replaces_without_growing() {
        let cache = SummaryCache::new(2);
        cache.insert("a", "5", "old".into());
        cache.insert("a", "5", "new".into());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a", "5").as_deref(), Some("new"));
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = SummaryCache::new(0);
        cache.insert("a", "5", "A".into());
        assert!(cache.is_empty());
    }
}

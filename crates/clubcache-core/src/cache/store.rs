//! The shared key → entry mapping.
//!
//! One `CacheStore` is built at start-up and handed to every query wrapper
//! behind an `Arc`. Each method takes the lock for its whole body and never
//! across an `.await`, so callers always observe the mapping either before
//! or after a complete operation.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use super::entry::{age_since, within_ttl, CacheEntry};
use super::lock::{rw_read, rw_write};

struct StoredEntry {
    data: Arc<dyn Any + Send + Sync>,
    captured_at: DateTime<Utc>,
    ttl: Duration,
}

/// Read-only snapshot for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
}

pub struct CacheStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
    clock: Arc<dyn Clock>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("size", &self.len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl CacheStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Look up an entry without checking its validity.
    ///
    /// An entry written with a different payload type reads as absent.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<CacheEntry<T>> {
        let entries = rw_read(&self.entries, "get");
        let stored = entries.get(key)?;
        match Arc::clone(&stored.data).downcast::<T>() {
            Ok(data) => Some(CacheEntry::new(data, stored.captured_at, stored.ttl)),
            Err(_) => {
                debug!(key, "Cached payload has a different type, treating as absent");
                None
            }
        }
    }

    /// Insert or replace the entry under `key`, stamped with the current time.
    pub fn set<T: Send + Sync + 'static>(
        &self,
        key: impl Into<String>,
        data: Arc<T>,
        ttl: Duration,
    ) -> CacheEntry<T> {
        let key = key.into();
        let captured_at = self.clock.now();
        let stored = StoredEntry {
            data: Arc::clone(&data) as Arc<dyn Any + Send + Sync>,
            captured_at,
            ttl,
        };
        rw_write(&self.entries, "set").insert(key, stored);
        CacheEntry::new(data, captured_at, ttl)
    }

    /// Whether an entry exists under `key` and is younger than `ttl`.
    pub fn is_cache_valid(&self, key: &str, ttl: Duration) -> bool {
        let now = self.clock.now();
        rw_read(&self.entries, "is_cache_valid")
            .get(key)
            .is_some_and(|stored| within_ttl(stored.captured_at, ttl, now))
    }

    /// Time since the entry under `key` was written, whatever its type.
    pub fn age_of(&self, key: &str) -> Option<chrono::Duration> {
        let now = self.clock.now();
        rw_read(&self.entries, "age_of")
            .get(key)
            .map(|stored| age_since(stored.captured_at, now))
    }

    /// Remove every entry whose key starts with `prefix`. Returns how many
    /// were removed.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let mut entries = rw_write(&self.entries, "invalidate");
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        drop(entries);
        info!(prefix, removed, "Invalidated cache entries");
        removed
    }

    /// Remove everything. Returns how many entries were dropped.
    pub fn clear(&self) -> usize {
        let mut entries = rw_write(&self.entries, "clear");
        let removed = entries.len();
        entries.clear();
        drop(entries);
        info!(removed, "Cleared cache");
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let entries = rw_read(&self.entries, "stats");
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        CacheStats {
            size: keys.len(),
            keys,
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn store_with_clock() -> (CacheStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        (CacheStore::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = CacheStore::new();
        assert!(store.get::<Vec<i32>>("players:{}").is_none());
        assert!(!store.is_cache_valid("players:{}", Duration::from_secs(60)));
    }

    #[test]
    fn test_set_then_get() {
        let (store, clock) = store_with_clock();
        store.set("players:{}", Arc::new(vec![1, 2, 3]), Duration::from_secs(60));

        let entry = store.get::<Vec<i32>>("players:{}").unwrap();
        assert_eq!(*entry.data, vec![1, 2, 3]);
        assert_eq!(entry.captured_at, clock.now());
        assert_eq!(entry.ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_age_of_any_payload_type() {
        let (store, clock) = store_with_clock();
        assert!(store.age_of("events:{}").is_none());

        store.set("events:{}", Arc::new("calendar".to_string()), Duration::from_secs(60));
        clock.advance(Duration::from_secs(42));
        assert_eq!(store.age_of("events:{}"), Some(chrono::Duration::seconds(42)));
    }

    #[test]
    fn test_get_with_wrong_type_is_none() {
        let store = CacheStore::new();
        store.set("players:{}", Arc::new(vec![1, 2, 3]), Duration::from_secs(60));
        assert!(store.get::<String>("players:{}").is_none());
        // The entry itself is untouched
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_does_not_check_validity() {
        let (store, clock) = store_with_clock();
        store.set("sessions:{}", Arc::new(1u32), Duration::from_secs(30));
        clock.advance(Duration::from_secs(600));
        assert!(store.get::<u32>("sessions:{}").is_some());
        assert!(!store.is_cache_valid("sessions:{}", Duration::from_secs(30)));
    }

    #[test]
    fn test_is_cache_valid_boundaries() {
        let (store, clock) = store_with_clock();
        let ttl = Duration::from_secs(30);
        store.set("sessions:{}", Arc::new(1u32), ttl);

        clock.advance(Duration::from_millis(29_999));
        assert!(store.is_cache_valid("sessions:{}", ttl));

        clock.advance(Duration::from_millis(2));
        assert!(!store.is_cache_valid("sessions:{}", ttl));
    }

    #[test]
    fn test_set_overwrites_and_restamps() {
        let (store, clock) = store_with_clock();
        let ttl = Duration::from_secs(30);
        store.set("events:{}", Arc::new("old".to_string()), ttl);
        clock.advance(Duration::from_secs(45));
        assert!(!store.is_cache_valid("events:{}", ttl));

        store.set("events:{}", Arc::new("new".to_string()), ttl);
        assert!(store.is_cache_valid("events:{}", ttl));
        assert_eq!(*store.get::<String>("events:{}").unwrap().data, "new");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_invalidate_by_prefix() {
        let store = CacheStore::new();
        let ttl = Duration::from_secs(60);
        store.set("players:{\"a\":1}", Arc::new(1u8), ttl);
        store.set("players:{\"a\":2}", Arc::new(2u8), ttl);
        store.set("staff:{}", Arc::new(3u8), ttl);
        store.set("categories:{}", Arc::new(4u8), ttl);

        assert_eq!(store.invalidate("players:"), 2);

        let stats = store.stats();
        assert_eq!(stats.size, 2);
        assert!(stats.keys.iter().all(|k| !k.starts_with("players:")));
        assert!(stats.keys.contains(&"staff:{}".to_string()));
        assert!(stats.keys.contains(&"categories:{}".to_string()));
    }

    #[test]
    fn test_invalidate_missing_prefix_is_noop() {
        let store = CacheStore::new();
        store.set("staff:{}", Arc::new(3u8), Duration::from_secs(60));
        assert_eq!(store.invalidate("players:"), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear() {
        let store = CacheStore::new();
        store.set("staff:{}", Arc::new(3u8), Duration::from_secs(60));
        store.set("events:{}", Arc::new(4u8), Duration::from_secs(60));
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert_eq!(store.stats(), CacheStats::default());
    }

    #[test]
    fn test_stats_sorted_and_read_only() {
        let store = CacheStore::new();
        store.set("staff:{}", Arc::new(3u8), Duration::from_secs(60));
        store.set("categories:{}", Arc::new(4u8), Duration::from_secs(60));

        let first = store.stats();
        let second = store.stats();
        assert_eq!(first, second);
        assert_eq!(first.keys, vec!["categories:{}".to_string(), "staff:{}".to_string()]);
    }

    #[test]
    fn test_concurrent_writers_leave_consistent_map() {
        let store = Arc::new(CacheStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.set(format!("players:{}:{}", t, i), Arc::new(i), Duration::from_secs(60));
                        if i % 10 == 0 {
                            store.invalidate(&format!("players:{}:", t));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = store.stats();
        assert_eq!(stats.size, stats.keys.len());
        // Each thread's last invalidation was at i = 90, leaving 91..=99
        assert_eq!(stats.size, 8 * 9);
    }
}

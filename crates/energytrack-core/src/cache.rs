//! Memoization for derived statistics.
//!
//! Nothing in this crate keeps global state: callers hand a
//! [`ComputationCache`] to the `*_cached` functions, or [`NoCache`] to
//! bypass caching. Values are stored as serialized JSON and keyed by a
//! prefix plus the serialized input.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Default bound for computation caches.
pub const DEFAULT_MAX_ENTRIES: usize = 100;
/// Default time-to-live for computation caches: 30 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

pub trait ComputationCache {
    fn get(&mut self, key: &str) -> Option<String>;
    fn put(&mut self, key: &str, value: String);
}

/// Source of "now" for expiry, in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Always misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ComputationCache for NoCache {
    fn get(&mut self, _key: &str) -> Option<String> {
        None
    }

    fn put(&mut self, _key: &str, _value: String) {}
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at_ms: u64,
}

/// Bounded in-memory cache with per-entry expiry. When full, the oldest
/// inserted key is evicted.
#[derive(Debug)]
pub struct TtlCache<C: Clock = SystemClock> {
    entries: HashMap<String, Entry>,
    order: VecDeque<String>,
    max_entries: usize,
    ttl: Duration,
    clock: C,
}

impl TtlCache<SystemClock> {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self::with_clock(max_entries, ttl, SystemClock)
    }
}

impl Default for TtlCache<SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL)
    }
}

impl<C: Clock> TtlCache<C> {
    pub fn with_clock(max_entries: usize, ttl: Duration, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries: max_entries.max(1),
            ttl,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Drop every expired entry.
    pub fn purge_expired(&mut self) {
        let now = self.clock.now_ms();
        self.entries.retain(|_, e| now <= e.expires_at_ms);
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

impl<C: Clock> ComputationCache for TtlCache<C> {
    fn get(&mut self, key: &str) -> Option<String> {
        let now = self.clock.now_ms();
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) => now > entry.expires_at_ms,
        };
        if expired {
            self.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    fn put(&mut self, key: &str, value: String) {
        let now = self.clock.now_ms();
        if self.entries.contains_key(key) {
            self.remove(key);
        }
        while self.entries.len() >= self.max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at_ms: now.saturating_add(self.ttl.as_millis() as u64),
            },
        );
        self.order.push_back(key.to_string());
    }
}

/// Build a cache key from a prefix and any serializable input.
pub fn cache_key<T: Serialize + ?Sized>(prefix: &str, input: &T) -> String {
    match serde_json::to_string(input) {
        Ok(json) => format!("{prefix}_{json}"),
        Err(_) => prefix.to_string(),
    }
}

/// Return the cached value for `key`, or compute, store and return it.
/// A cached value that no longer deserializes is recomputed.
pub fn memoize<T, F>(cache: &mut dyn ComputationCache, key: &str, compute: F) -> T
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> T,
{
    if let Some(raw) = cache.get(key) {
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key_len = key.len(), "computation cache hit");
                return value;
            }
            Err(err) => debug!(error = %err, "discarding unreadable cache entry"),
        }
    }

    let value = compute();
    match serde_json::to_string(&value) {
        Ok(raw) => cache.put(key, raw),
        Err(err) => debug!(error = %err, "result not cacheable"),
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<u64>>);

    impl ManualClock {
        fn advance(&self, ms: u64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    fn cache(max: usize, ttl_ms: u64) -> (TtlCache<ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        (
            TtlCache::with_clock(max, Duration::from_millis(ttl_ms), clock.clone()),
            clock,
        )
    }

    #[test]
    fn test_get_after_put() {
        let (mut c, _) = cache(10, 1_000);
        c.put("a", "1".to_string());
        assert_eq!(c.get("a"), Some("1".to_string()));
        assert_eq!(c.get("b"), None);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (mut c, clock) = cache(10, 1_000);
        c.put("a", "1".to_string());
        clock.advance(1_000);
        assert!(c.contains("a"));
        clock.advance(1);
        assert!(!c.contains("a"));
        assert!(c.is_empty());
    }

    #[test]
    fn test_oldest_entry_evicted_when_full() {
        let (mut c, _) = cache(2, 1_000);
        c.put("a", "1".to_string());
        c.put("b", "2".to_string());
        c.put("c", "3".to_string());
        assert_eq!(c.len(), 2);
        assert_eq!(c.get("a"), None);
        assert_eq!(c.get("c"), Some("3".to_string()));
    }

    #[test]
    fn test_overwrite_refreshes_position() {
        let (mut c, _) = cache(2, 1_000);
        c.put("a", "1".to_string());
        c.put("b", "2".to_string());
        c.put("a", "10".to_string());
        c.put("c", "3".to_string());
        assert_eq!(c.get("a"), Some("10".to_string()));
        assert_eq!(c.get("b"), None);
    }

    #[test]
    fn test_purge_expired() {
        let (mut c, clock) = cache(10, 100);
        c.put("a", "1".to_string());
        clock.advance(50);
        c.put("b", "2".to_string());
        clock.advance(60);
        c.purge_expired();
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("b"), Some("2".to_string()));
    }

    #[test]
    fn test_memoize_computes_once() {
        let (mut c, _) = cache(10, 1_000);
        let mut calls = 0;
        let first: u32 = memoize(&mut c, "k", || {
            calls += 1;
            42
        });
        let second: u32 = memoize(&mut c, "k", || {
            calls += 1;
            0
        });
        assert_eq!((first, second), (42, 42));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_memoize_with_no_cache_always_computes() {
        let mut calls = 0;
        for _ in 0..3 {
            let _: u32 = memoize(&mut NoCache, "k", || {
                calls += 1;
                1
            });
        }
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_memoize_recomputes_corrupt_entry() {
        let (mut c, _) = cache(10, 1_000);
        c.put("k", "not json".to_string());
        let value: Vec<u8> = memoize(&mut c, "k", || vec![1, 2]);
        assert_eq!(value, vec![1, 2]);
        assert_eq!(c.get("k"), Some("[1,2]".to_string()));
    }

    #[test]
    fn test_cache_key_includes_input() {
        assert_eq!(cache_key("patterns", &[1, 2]), "patterns_[1,2]");
        assert_ne!(cache_key("p", "a"), cache_key("p", "b"));
    }
}

//! Small in-memory key/value store whose entries vanish after a fixed TTL.
//!
//! Backs login sessions and password-reset tokens. Expiry is enforced on
//! every read, so a stale entry is never handed out even between sweeps.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

pub struct ExpiringMap<K, V> {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<K, Entry<V>>>>,
}

impl<K, V> Clone for ExpiringMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            ttl: self.ttl,
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> ExpiringMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn insert(&self, key: K, value: V) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().insert(key, entry);
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_valid(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Removes the entry, returning it only if it had not expired.
    pub fn take(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        self.entries
            .lock()
            .remove(key)
            .filter(|entry| entry.is_valid(now))
            .map(|entry| entry.value)
    }

    pub fn remove(&self, key: &K) {
        self.entries.lock().remove(key);
    }

    /// Drops every entry matching `predicate`, expired or not.
    pub fn remove_where(&self, mut predicate: impl FnMut(&V) -> bool) {
        self.entries.lock().retain(|_, entry| !predicate(&entry.value));
    }

    /// Drops expired entries and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> ExpiringMap<K, V>
where
    K: Eq + Hash + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Sweeps the map every `interval` until the runtime shuts down.
    pub fn spawn_sweeper(&self, name: &'static str, interval: Duration) -> tokio::task::JoinHandle<()> {
        let map = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = map.sweep();
                if removed > 0 {
                    tracing::debug!(store = name, removed, "Swept expired entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_live_entries() {
        let map = ExpiringMap::new(Duration::from_secs(60));
        map.insert("a", 1);
        assert_eq!(map.get(&"a"), Some(1));
        assert_eq!(map.get(&"b"), None);
    }

    #[test]
    fn test_zero_ttl_is_never_returned() {
        let map = ExpiringMap::new(Duration::ZERO);
        map.insert("a", 1);
        assert_eq!(map.get(&"a"), None);
        // the read also evicted it
        assert!(map.is_empty());
    }

    #[test]
    fn test_take_consumes_entry() {
        let map = ExpiringMap::new(Duration::from_secs(60));
        map.insert("token", 7);
        assert_eq!(map.take(&"token"), Some(7));
        assert_eq!(map.take(&"token"), None);
    }

    #[test]
    fn test_take_ignores_expired_entry() {
        let map = ExpiringMap::new(Duration::ZERO);
        map.insert("token", 7);
        assert_eq!(map.take(&"token"), None);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let live = ExpiringMap::new(Duration::from_secs(60));
        live.insert(1, "x");
        assert_eq!(live.sweep(), 0);
        assert_eq!(live.len(), 1);

        let dead = ExpiringMap::new(Duration::ZERO);
        dead.insert(1, "x");
        dead.insert(2, "y");
        assert_eq!(dead.sweep(), 2);
        assert!(dead.is_empty());
    }

    #[test]
    fn test_remove_where_matches_values() {
        let map = ExpiringMap::new(Duration::from_secs(60));
        map.insert("s1", 10);
        map.insert("s2", 20);
        map.insert("s3", 10);
        map.remove_where(|v| *v == 10);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&"s2"), Some(20));
    }

    #[tokio::test]
    async fn test_sweeper_task_clears_map() {
        let map = ExpiringMap::new(Duration::ZERO);
        map.insert(1, ());
        let handle = map.spawn_sweeper("test", Duration::from_secs(60));
        // first tick fires immediately
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(map.is_empty());
        handle.abort();
    }
}

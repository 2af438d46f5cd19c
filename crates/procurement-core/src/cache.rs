//! In-memory TTL cache shared by the search and enrichment stages

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Cache entry with TTL
#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Key→value store with TTL eviction and a hard entry cap.
///
/// [`TtlCache::get_or_try_insert_with`] serializes initialisation per key, so
/// callers racing on the same key share a single upstream computation.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    inflight: InflightMap,
    default_ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    /// Create cache with the given TTL and entry cap
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            default_ttl: ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Get cached value if exists and not expired
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;

        if Instant::now() < entry.expires_at {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Set cached value with default TTL
    pub fn insert(&self, key: String, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl)
    }

    /// Set cached value with custom TTL
    pub fn insert_with_ttl(&self, key: String, value: V, ttl: Duration) {
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            expires_at: now + ttl,
        };

        if let Ok(mut entries) = self.entries.write() {
            if entries.len() >= self.max_entries && !entries.contains_key(&key) {
                entries.retain(|_, e| now < e.expires_at);
                if entries.len() >= self.max_entries {
                    // Evict whichever entry expires soonest
                    if let Some(oldest) = entries
                        .iter()
                        .min_by_key(|(_, e)| e.expires_at)
                        .map(|(k, _)| k.clone())
                    {
                        entries.remove(&oldest);
                    }
                }
            }
            entries.insert(key, entry);
        }
    }

    /// Return the cached value, or run `init` exactly once for concurrent callers of `key`.
    ///
    /// Errors are returned to the caller that ran `init` and are not cached;
    /// the next waiter retries the computation.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: &str, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let inflight = InflightSlot::claim(&self.inflight, key);
        let _guard = inflight.gate.lock().await;
        match self.get(key) {
            Some(value) => Ok(value),
            None => {
                let result = init().await;
                if let Ok(ref value) = result {
                    self.insert(key.to_string(), value.clone());
                }
                result
            }
        }
    }

    /// Clear expired entries
    pub fn cleanup(&self) {
        if let Ok(mut entries) = self.entries.write() {
            let now = Instant::now();
            entries.retain(|_, entry| now < entry.expires_at);
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        if let Ok(entries) = self.entries.read() {
            let now = Instant::now();
            let total = entries.len();
            let expired = entries.values().filter(|e| now >= e.expires_at).count();

            CacheStats {
                total_entries: total,
                expired_entries: expired,
                active_entries: total - expired,
            }
        } else {
            CacheStats::default()
        }
    }
}

type InflightMap = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Per-key gate, released from the map when the last holder goes away,
/// including when the holding future is dropped mid-initialisation.
struct InflightSlot<'a> {
    map: &'a InflightMap,
    key: &'a str,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> InflightSlot<'a> {
    fn claim(map: &'a InflightMap, key: &'a str) -> Self {
        let gate = map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        Self { map, key, gate }
    }
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        let mut inflight = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = inflight.get(self.key) {
            // Map + this slot hold the only references: nobody else is waiting
            if Arc::ptr_eq(existing, &self.gate) && Arc::strong_count(&self.gate) <= 2 {
                inflight.remove(self.key);
            }
        }
    }
}

/// Cache statistics
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Normalize a free-text key component: trimmed, lowercased, whitespace collapsed
pub fn normalize_key_part(part: &str) -> String {
    part.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a namespaced cache key from normalized parts; absent parts read as `-`
pub fn cache_key(namespace: &str, parts: &[Option<&str>]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        let normalized = part.map(normalize_key_part).unwrap_or_else(|| "-".to_string());
        hasher.update(normalized.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(12).map(|b| format!("{:02x}", b)).collect();
    format!("{}:{}", namespace, hex)
}

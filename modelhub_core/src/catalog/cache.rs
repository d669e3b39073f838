use crate::models::Model;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    signature: String,
    models: Vec<Model>,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, signature: &str, ttl: Duration, now: Instant) -> bool {
        self.signature == signature && now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Single-slot, TTL-bounded cache of the last parsed catalog.
///
/// Only the most recent binding's result is retained. Age is measured on the
/// monotonic clock, so wall-clock steps never extend an entry's life. Reads and writes copy
/// the model list so no two callers share the same vector.
#[derive(Debug)]
pub struct CatalogCache {
    ttl: Duration,
    slot: RwLock<Option<CacheEntry>>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn lookup(&self, signature: &str) -> Option<Vec<Model>> {
        self.lookup_at(signature, Instant::now()).await
    }

    /// Return a copy of the cached models if the slot matches `signature`
    /// and is still fresh at `now`.
    pub async fn lookup_at(&self, signature: &str, now: Instant) -> Option<Vec<Model>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.is_fresh(signature, self.ttl, now))
            .map(|entry| entry.models.clone())
    }

    pub async fn store(&self, signature: impl Into<String>, models: &[Model]) {
        self.store_at(signature, models, Instant::now()).await;
    }

    /// Replace the slot. Last write wins.
    pub async fn store_at(
        &self,
        signature: impl Into<String>,
        models: &[Model],
        fetched_at: Instant,
    ) {
        let entry = CacheEntry {
            signature: signature.into(),
            models: models.to_vec(),
            fetched_at,
        };
        *self.slot.write().await = Some(entry);
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}

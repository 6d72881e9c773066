//! services/api/src/adapters/session_cache.rs
//!
//! In-process session cache with a fixed time-to-live and a periodic sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dealership_core::ports::SessionCache;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct MemorySessionCache {
    entries: Arc<RwLock<HashMap<String, CachedToken>>>,
    ttl: Duration,
}

impl MemorySessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// A zero TTL disables the cache: every write is refused.
    pub fn enabled(&self) -> bool {
        self.ttl > Duration::ZERO
    }

    /// Removes expired entries and returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Runs [`sweep`](Self::sweep) every `period` until `shutdown` is cancelled.
    pub fn spawn_sweeper(&self, period: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Session sweeper stopped.");
                        break;
                    }
                    _ = ticker.tick() => {
                        let expired = cache.sweep().await;
                        if expired > 0 {
                            debug!(expired, "swept expired sessions");
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn set(&self, key: &str, value: String) -> bool {
        if !self.enabled() {
            return false;
        }
        let Some(expires_at) = Instant::now().checked_add(self.ttl) else {
            return false;
        };
        self.entries.write().await.insert(
            key.to_string(),
            CachedToken {
                token: value,
                expires_at,
            },
        );
        true
    }

    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.token.clone())
    }

    async fn has(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn delete(&self, key: &str) -> usize {
        usize::from(self.entries.write().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_overwrites_and_delete_counts() {
        let cache = MemorySessionCache::new(Duration::from_secs(60));
        assert!(cache.set("jwt:a", "first".into()).await);
        assert!(cache.set("jwt:a", "second".into()).await);
        assert_eq!(cache.get("jwt:a").await.as_deref(), Some("second"));
        assert!(cache.has("jwt:a").await);

        assert_eq!(cache.delete("jwt:a").await, 1);
        assert_eq!(cache.delete("jwt:a").await, 0);
        assert!(!cache.has("jwt:a").await);
    }

    #[tokio::test]
    async fn expired_entries_are_invisible_and_swept() {
        let cache = MemorySessionCache::new(Duration::from_millis(20));
        assert!(cache.set("jwt:b", "token".into()).await);
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(!cache.has("jwt:b").await);
        assert_eq!(cache.sweep().await, 1);
        assert_eq!(cache.sweep().await, 0);
    }

    #[tokio::test]
    async fn zero_ttl_refuses_writes() {
        let cache = MemorySessionCache::new(Duration::ZERO);
        assert!(!cache.set("jwt:c", "token".into()).await);
        assert!(cache.get("jwt:c").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_writers_leave_one_value() {
        let cache = MemorySessionCache::new(Duration::from_secs(60));
        let writers: Vec<_> = (0..16)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.set("jwt:d", format!("token-{i}")).await })
            })
            .collect();
        for writer in writers {
            assert!(writer.await.unwrap());
        }
        let value = cache.get("jwt:d").await.unwrap();
        assert!(value.starts_with("token-"));
    }

    #[tokio::test]
    async fn sweeper_stops_on_cancel() {
        let cache = MemorySessionCache::new(Duration::from_millis(10));
        cache.set("jwt:e", "token".into()).await;
        let shutdown = CancellationToken::new();
        let handle = cache.spawn_sweeper(Duration::from_millis(5), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.entries.read().await.len(), 0);

        shutdown.cancel();
        handle.await.unwrap();
    }
}

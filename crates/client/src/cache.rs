//! Query cache keyed by logical query identity.
//!
//! Guarantees at most one in-flight fetch per key: concurrent readers await
//! the leader's result instead of issuing duplicate upstream calls.
//! Invalidation bumps a per-key version; a fetch that started under an older
//! version discards its result on completion and retries, so the cache always
//! ends up holding the most recently *completed* non-superseded fetch
//! (last-write-wins on completion order, not request order). Readers may see
//! the previous value until a background re-fetch lands; the workflow display
//! is informational, not transactional.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

pub type FetchFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send>>;
pub type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

/// Structured cache key: resource name plus an optional scoping identifier
/// (e.g. the user's email), so invalidating "all orders for user X" never
/// touches unrelated queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: String,
    pub scope: Option<String>,
}

impl QueryKey {
    pub fn scoped(resource: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            scope: Some(scope.into()),
        }
    }

    pub fn global(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            scope: None,
        }
    }
}

#[derive(Default)]
struct Entry {
    value: Option<Arc<Value>>,
    stale: bool,
    /// Bumped on every invalidation; fetches capture it at start and must
    /// still match at completion to be stored.
    version: u64,
    /// Present while a leader fetch is running; followers wait on it.
    inflight: Option<watch::Receiver<bool>>,
    /// Last fetcher registered for this key, used for background re-fetch
    /// after invalidation.
    refetch: Option<Fetcher>,
}

enum Role {
    Hit(Arc<Value>),
    Follower(watch::Receiver<bool>),
    Leader(watch::Sender<bool>, u64),
}

/// Shared, cheaply clonable cache handle. All map access is behind one
/// mutex; no lock is held across an await.
#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
}

impl QueryCache {
    /// Return the fresh cached value, or run/await a fetch for the key.
    pub async fn fetch_with(&self, key: &QueryKey, fetcher: Fetcher) -> anyhow::Result<Arc<Value>> {
        loop {
            let role = {
                let mut entries = self.entries.lock().unwrap();
                let entry = entries.entry(key.clone()).or_default();
                entry.refetch = Some(fetcher.clone());

                if let Some(value) = entry.value.clone().filter(|_| !entry.stale) {
                    Role::Hit(value)
                } else if let Some(rx) = entry
                    .inflight
                    .as_ref()
                    // A receiver whose sender is gone belongs to a cancelled
                    // leader; take over instead of waiting forever.
                    .filter(|rx| rx.has_changed().is_ok())
                    .cloned()
                {
                    Role::Follower(rx)
                } else {
                    let (tx, rx) = watch::channel(false);
                    entry.inflight = Some(rx);
                    Role::Leader(tx, entry.version)
                }
            };

            match role {
                Role::Hit(value) => return Ok(value),
                Role::Follower(mut rx) => {
                    let _ = rx.changed().await;
                }
                Role::Leader(tx, started_version) => {
                    let result = fetcher().await;

                    let outcome = {
                        let mut entries = self.entries.lock().unwrap();
                        let entry = entries.entry(key.clone()).or_default();
                        entry.inflight = None;
                        match result {
                            Ok(value) if entry.version == started_version => {
                                let value = Arc::new(value);
                                entry.value = Some(value.clone());
                                entry.stale = false;
                                Some(Ok(value))
                            }
                            Ok(_) => {
                                tracing::debug!(
                                    resource = %key.resource,
                                    "fetch superseded by invalidation, discarding result"
                                );
                                None
                            }
                            Err(e) => Some(Err(e)),
                        }
                    };

                    let _ = tx.send(true);
                    match outcome {
                        Some(result) => return result,
                        None => continue,
                    }
                }
            }
        }
    }

    /// Typed read; the fetcher still produces raw JSON.
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        key: &QueryKey,
        fetcher: Fetcher,
    ) -> anyhow::Result<T> {
        let value = self.fetch_with(key, fetcher).await?;
        serde_json::from_value((*value).clone())
            .context("cached value did not match the requested type")
    }

    /// Current cached value, if any, without triggering a fetch.
    pub fn peek(&self, key: &QueryKey) -> Option<Arc<Value>> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .and_then(|entry| entry.value.clone())
    }

    /// Mark a key stale and schedule a background re-fetch with its last
    /// registered fetcher. Asynchronous relative to the trigger: readers may
    /// observe the previous value until the re-fetch completes.
    pub fn invalidate(&self, key: &QueryKey) {
        let refetch = {
            let mut entries = self.entries.lock().unwrap();
            let Some(entry) = entries.get_mut(key) else {
                return;
            };
            entry.stale = true;
            entry.version += 1;
            entry.refetch.clone()
        };

        if let Some(fetcher) = refetch {
            let cache = self.clone();
            let key = key.clone();
            tokio::spawn(async move {
                if let Err(e) = cache.fetch_with(&key, fetcher).await {
                    tracing::warn!(resource = %key.resource, "background re-fetch failed: {e:#}");
                }
            });
        }
    }

    /// Invalidate every key whose resource name matches.
    pub fn invalidate_resource(&self, resource: &str) {
        self.invalidate_matching(|key| key.resource == resource);
    }

    pub fn invalidate_matching(&self, predicate: impl Fn(&QueryKey) -> bool) {
        let keys: Vec<QueryKey> = self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|key| predicate(key))
            .cloned()
            .collect();
        for key in keys {
            self.invalidate(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn counting_fetcher(calls: Arc<AtomicUsize>) -> Fetcher {
        Arc::new(move || {
            let calls = calls.clone();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(json!({ "fetch": n }))
            })
        })
    }

    #[tokio::test]
    async fn concurrent_readers_share_one_fetch() {
        let cache = QueryCache::default();
        let key = QueryKey::scoped("orders", "user@example.com");
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(calls.clone());

        let (a, b) = tokio::join!(
            cache.fetch_with(&key, fetcher.clone()),
            cache.fetch_with(&key, fetcher.clone()),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*a.unwrap(), *b.unwrap());
    }

    #[tokio::test]
    async fn cached_value_is_returned_without_refetching() {
        let cache = QueryCache::default();
        let key = QueryKey::global("announcements");
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(calls.clone());

        cache.fetch_with(&key, fetcher.clone()).await.unwrap();
        cache.fetch_with(&key, fetcher.clone()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_triggers_background_refetch() {
        let cache = QueryCache::default();
        let key = QueryKey::scoped("orders", "user@example.com");
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(calls.clone());

        cache.fetch_with(&key, fetcher.clone()).await.unwrap();
        cache.invalidate(&key);

        // Background re-fetch runs without any reader asking.
        for _ in 0..50 {
            if calls.load(Ordering::SeqCst) == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The next read is served from the refreshed entry.
        let value = cache.fetch_with(&key, fetcher.clone()).await.unwrap();
        assert_eq!(value["fetch"], 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unrelated_scopes_are_untouched_by_invalidation() {
        let cache = QueryCache::default();
        let key_a = QueryKey::scoped("orders", "a@example.com");
        let key_b = QueryKey::scoped("orders", "b@example.com");
        let key_c = QueryKey::global("announcements");
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(calls.clone());

        cache.fetch_with(&key_a, fetcher.clone()).await.unwrap();
        cache.fetch_with(&key_b, fetcher.clone()).await.unwrap();
        cache.fetch_with(&key_c, fetcher.clone()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cache.invalidate_resource("orders");
        for _ in 0..50 {
            if calls.load(Ordering::SeqCst) == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        // Both order scopes re-fetched; announcements untouched.
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(cache.peek(&key_c).unwrap()["fetch"], 3);
    }

    #[tokio::test]
    async fn fetch_superseded_by_invalidation_is_discarded() {
        let cache = QueryCache::default();
        let key = QueryKey::scoped("orders", "user@example.com");

        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher: Fetcher = {
            let gate = gate.clone();
            let calls = calls.clone();
            Arc::new(move || {
                let gate = gate.clone();
                let calls = calls.clone();
                Box::pin(async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        // First fetch: the slow one that gets superseded.
                        gate.notified().await;
                        Ok(json!("old"))
                    } else {
                        Ok(json!("new"))
                    }
                })
            })
        };

        let reader = tokio::spawn({
            let cache = cache.clone();
            let key = key.clone();
            let fetcher = fetcher.clone();
            async move { cache.fetch_with(&key, fetcher).await }
        });

        // Let the slow fetch become leader, then invalidate mid-flight.
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.invalidate(&key);
        gate.notify_waiters();

        let value = reader.await.unwrap().unwrap();
        assert_eq!(*value, json!("new"));

        // Whatever fetches raced, the stored value is never the stale one.
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert_ne!(*cache.peek(&key).unwrap(), json!("old"));
        }
    }

    #[tokio::test]
    async fn fetch_errors_propagate_and_are_not_cached() {
        let cache = QueryCache::default();
        let key = QueryKey::global("announcements");
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher: Fetcher = {
            let calls = calls.clone();
            Arc::new(move || {
                let calls = calls.clone();
                Box::pin(async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        anyhow::bail!("backend unavailable");
                    }
                    Ok(json!({ "ok": true }))
                })
            })
        };

        let err = cache.fetch_with(&key, fetcher.clone()).await.unwrap_err();
        assert!(err.to_string().contains("backend unavailable"));
        assert!(cache.peek(&key).is_none());

        let value = cache.fetch_with(&key, fetcher).await.unwrap();
        assert_eq!(value["ok"], true);
    }
}

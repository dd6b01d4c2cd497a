use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::cache::{ CacheEntry, CacheKey, CacheStore };
use crate::core::CacheResult;
use crate::fetch::{ FetchRequest, FetchResponse, NetworkBackend };

/// Fire-and-forget refetch that overwrites a cache entry.
///
/// Failures are logged and discarded: a revalidation error never
/// reaches the caller that triggered it and is never retried. The same
/// machinery drains the losing fetch of a NetworkFirst race into the
/// store once it finally settles.
pub struct BackgroundRevalidator {
    store: Arc<dyn CacheStore>,
    backend: Arc<dyn NetworkBackend>,
}

impl BackgroundRevalidator {
    pub fn new(store: Arc<dyn CacheStore>, backend: Arc<dyn NetworkBackend>) -> Self {
        Self { store, backend }
    }

    /// Refetch `request` and replace the entry at `key` on success.
    /// Callers do not block; the returned handle exists for tests.
    pub fn spawn(&self, partition: &str, key: CacheKey, request: FetchRequest) -> JoinHandle<()> {
        let store = self.store.clone();
        let backend = self.backend.clone();
        let partition = partition.to_string();

        tokio::spawn(async move {
            let result = backend.fetch(&request).await;
            store_if_ok(&*store, &partition, &key, result, "Revalidation").await;
        })
    }

    /// Await an already-running fetch task and store its result. The
    /// caller of the race has moved on; this result is only for future
    /// reads.
    pub fn spawn_drain(
        &self,
        partition: &str,
        key: CacheKey,
        inflight: JoinHandle<CacheResult<FetchResponse>>
    ) -> JoinHandle<()> {
        let store = self.store.clone();
        let partition = partition.to_string();

        tokio::spawn(async move {
            match inflight.await {
                Ok(result) => {
                    store_if_ok(&*store, &partition, &key, result, "Late network result").await;
                }
                Err(e) => {
                    log::warn!("Late fetch task for {} aborted: {}", key, e);
                }
            }
        })
    }
}

async fn store_if_ok(
    store: &dyn CacheStore,
    partition: &str,
    key: &CacheKey,
    result: CacheResult<FetchResponse>,
    what: &str
) {
    match result {
        Ok(response) if response.ok() => {
            store.put(partition, CacheEntry::capture(key, &response)).await;
            log::debug!("{} refreshed {} in {}", what, key, partition);
        }
        Ok(response) => {
            log::warn!("{} for {} returned status {}; entry kept as-is", what, key, response.status);
        }
        Err(e) => {
            log::warn!("{} failed for {}: {}", what, key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::core::constants::PARTITION_API;
    use crate::fetch::testing::{ dated_response, parse_url, ScriptedBackend };

    const URL: &str = "https://api.dexscreener.com/latest/dex/tokens/abc";

    fn setup() -> (Arc<MemoryStore>, Arc<ScriptedBackend>, BackgroundRevalidator) {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(ScriptedBackend::new());
        let revalidator = BackgroundRevalidator::new(store.clone(), backend.clone());
        (store, backend, revalidator)
    }

    fn seeded_entry() -> CacheEntry {
        let key = CacheKey::new("GET", &parse_url(URL));
        CacheEntry::capture(&key, &dated_response(200, "old"))
    }

    #[tokio::test]
    async fn test_success_overwrites_entry() {
        let (store, backend, revalidator) = setup();
        let entry = seeded_entry();
        let key = entry.key.clone();
        store.put(PARTITION_API, entry).await;
        backend.push_ok(URL, "fresh");

        let handle = revalidator.spawn(PARTITION_API, key.clone(), FetchRequest::get(parse_url(URL)));
        handle.await.unwrap();

        assert_eq!(store.get(PARTITION_API, &key).await.unwrap().body, b"fresh");
    }

    #[tokio::test]
    async fn test_failure_is_absorbed_and_entry_kept() {
        let (store, backend, revalidator) = setup();
        let entry = seeded_entry();
        let key = entry.key.clone();
        store.put(PARTITION_API, entry).await;
        backend.push_err(URL);

        let handle = revalidator.spawn(PARTITION_API, key.clone(), FetchRequest::get(parse_url(URL)));
        handle.await.unwrap();

        // Single attempt, old entry untouched
        assert_eq!(backend.calls_for(URL), 1);
        assert_eq!(store.get(PARTITION_API, &key).await.unwrap().body, b"old");
    }

    #[tokio::test]
    async fn test_not_ok_response_is_not_stored() {
        let (store, backend, revalidator) = setup();
        let entry = seeded_entry();
        let key = entry.key.clone();
        store.put(PARTITION_API, entry).await;
        backend.push(URL, Ok(dated_response(502, "bad gateway")));

        let handle = revalidator.spawn(PARTITION_API, key.clone(), FetchRequest::get(parse_url(URL)));
        handle.await.unwrap();

        assert_eq!(store.get(PARTITION_API, &key).await.unwrap().body, b"old");
    }

    #[tokio::test]
    async fn test_drain_stores_late_result() {
        let (store, backend, revalidator) = setup();
        let key = CacheKey::new("GET", &parse_url(URL));
        backend.push_ok(URL, "late");

        let backend_clone = backend.clone();
        let inflight = tokio::spawn(async move {
            backend_clone.fetch(&FetchRequest::get(parse_url(URL))).await
        });

        let handle = revalidator.spawn_drain(PARTITION_API, key.clone(), inflight);
        handle.await.unwrap();

        assert_eq!(store.get(PARTITION_API, &key).await.unwrap().body, b"late");
    }
}

//! Strategy execution on top of the store, the staleness evaluator and
//! the background revalidator.
//!
//! Two gaps are carried over deliberately from the worker this replaces:
//! the losing fetch of a NetworkFirst race is never aborted (its result
//! is drained into the store once it settles), and concurrent requests
//! for the same key are not coalesced - each one triggers its own
//! network fetch, last write wins at the key.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{ CacheEntry, CacheKey, CacheStore };
use crate::classify::{ Classification, Strategy };
use crate::core::{ CacheError, CacheResult };
use crate::fetch::{ FetchRequest, FetchResponse, NetworkBackend };
use crate::revalidate::BackgroundRevalidator;
use crate::staleness;

/// Cache key for a classified request, including the vary dimension
/// when the rule names one
pub fn cache_key_for(request: &FetchRequest, classification: &Classification) -> CacheKey {
    let vary = classification.vary_header
        .as_deref()
        .and_then(|header| request.header(header));
    CacheKey::with_vary(&request.method, &request.url, vary)
}

pub struct StrategyExecutor {
    store: Arc<dyn CacheStore>,
    backend: Arc<dyn NetworkBackend>,
    revalidator: BackgroundRevalidator,
    race_timeout: Duration,
}

impl StrategyExecutor {
    pub fn new(
        store: Arc<dyn CacheStore>,
        backend: Arc<dyn NetworkBackend>,
        race_timeout: Duration
    ) -> Self {
        let revalidator = BackgroundRevalidator::new(store.clone(), backend.clone());
        Self {
            store,
            backend,
            revalidator,
            race_timeout,
        }
    }

    /// Run the classified strategy. Exactly one response (or error) is
    /// delivered per call, no matter how many operations were in
    /// flight underneath.
    pub async fn execute(
        &self,
        request: &FetchRequest,
        classification: &Classification
    ) -> CacheResult<FetchResponse> {
        let key = cache_key_for(request, classification);
        match classification.strategy {
            Strategy::CacheFirst => self.cache_first(request, &key, classification).await,
            Strategy::NetworkFirst => self.network_first(request, &key, classification).await,
            Strategy::StaleWhileRevalidate => {
                self.stale_while_revalidate(request, &key, classification).await
            }
        }
    }

    /// Cache wins when present. A stale hit is still returned
    /// immediately; refreshing happens behind the caller's back.
    async fn cache_first(
        &self,
        request: &FetchRequest,
        key: &CacheKey,
        classification: &Classification
    ) -> CacheResult<FetchResponse> {
        if let Some(entry) = self.store.get(&classification.partition, key).await {
            if staleness::is_stale(&entry, classification.max_age) {
                log::debug!("Stale hit for {}, revalidating in background", key);
                self.revalidator.spawn(&classification.partition, key.clone(), request.clone());
            }
            return Ok(entry.to_response());
        }

        // Miss: one blocking fetch. A network error here has no entry
        // to fall back to and propagates as-is.
        let response = self.backend.fetch(request).await?;
        if response.ok() {
            self.store.put(&classification.partition, CacheEntry::capture(key, &response)).await;
        }
        Ok(response)
    }

    /// Network wins when it settles inside the race window; the cache
    /// covers timeouts and failures. The losing fetch keeps running
    /// and its result lands in the store for future reads only.
    async fn network_first(
        &self,
        request: &FetchRequest,
        key: &CacheKey,
        classification: &Classification
    ) -> CacheResult<FetchResponse> {
        // Both operations start independently.
        let mut inflight = {
            let backend = self.backend.clone();
            let request = request.clone();
            tokio::spawn(async move { backend.fetch(&request).await })
        };
        let lookup = {
            let store = self.store.clone();
            let partition = classification.partition.clone();
            let key = key.clone();
            tokio::spawn(async move { store.get(&partition, &key).await })
        };

        match tokio::time::timeout(self.race_timeout, &mut inflight).await {
            Ok(Ok(Ok(response))) => {
                // Settled in time. Successful responses refresh the
                // entry; a not-ok response is delivered but never
                // stored.
                if response.ok() {
                    self.store.put(
                        &classification.partition,
                        CacheEntry::capture(key, &response)
                    ).await;
                }
                Ok(response)
            }
            Ok(Ok(Err(network_err))) => {
                log::debug!("Network failed for {}: {}", key, network_err);
                match lookup.await.unwrap_or(None) {
                    Some(entry) => Ok(entry.to_response()),
                    None => Err(network_err),
                }
            }
            Ok(Err(join_err)) => {
                // The fetch task itself died; treat like a failed fetch.
                log::warn!("Fetch task for {} failed: {}", key, join_err);
                match lookup.await.unwrap_or(None) {
                    Some(entry) => Ok(entry.to_response()),
                    None => Err(CacheError::Network(join_err.to_string())),
                }
            }
            Err(_elapsed) => {
                // Timer fired first. The fetch is not aborted: its
                // eventual result still overwrites the entry, it is
                // just never delivered to this caller.
                self.revalidator.spawn_drain(&classification.partition, key.clone(), inflight);
                match lookup.await.unwrap_or(None) {
                    Some(entry) => Ok(entry.to_response()),
                    None =>
                        Err(CacheError::Timeout {
                            ms: self.race_timeout.as_millis() as u64,
                        }),
                }
            }
        }
    }

    /// Any entry, stale or not, is returned without touching the
    /// network on the caller's path.
    async fn stale_while_revalidate(
        &self,
        request: &FetchRequest,
        key: &CacheKey,
        classification: &Classification
    ) -> CacheResult<FetchResponse> {
        if let Some(entry) = self.store.get(&classification.partition, key).await {
            self.revalidator.spawn(&classification.partition, key.clone(), request.clone());
            return Ok(entry.to_response());
        }

        let response = self.backend.fetch(request).await?;
        if response.ok() {
            self.store.put(&classification.partition, CacheEntry::capture(key, &response)).await;
        }
        Ok(response)
    }
}

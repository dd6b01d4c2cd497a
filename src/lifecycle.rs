//! Service lifecycle: Installing -> Installed -> Activating -> Active.
//!
//! One controller instance owns the classifier, the strategy executor
//! and the eviction manager, and routes every intercepted fetch. It is
//! constructed explicitly at process start with an injected store -
//! there is no ambient worker state.

use std::collections::HashSet;
use std::sync::{ Arc, RwLock };
use std::time::Duration;
use url::Url;

use crate::cache::{ CacheEntry, CacheKey, CacheStore, EvictionManager };
use crate::classify::Classifier;
use crate::core::constants::*;
use crate::core::{ CacheError, CacheResult, SiteConfig };
use crate::fetch::{ FetchRequest, FetchResponse, NetworkBackend };
use crate::strategy::StrategyExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Installing,
    Installed,
    Activating,
    Active,
}

pub struct LifecycleController {
    config: SiteConfig,
    store: Arc<dyn CacheStore>,
    backend: Arc<dyn NetworkBackend>,
    classifier: Classifier,
    executor: StrategyExecutor,
    eviction: EvictionManager,
    state: RwLock<LifecycleState>,
}

impl LifecycleController {
    pub fn new(
        config: SiteConfig,
        store: Arc<dyn CacheStore>,
        backend: Arc<dyn NetworkBackend>
    ) -> Self {
        let classifier = Classifier::new(&config);
        let executor = StrategyExecutor::new(
            store.clone(),
            backend.clone(),
            Duration::from_millis(config.network.race_timeout_ms)
        );
        let eviction = EvictionManager::new(config.partitions.clone());

        Self {
            config,
            store,
            backend,
            classifier,
            executor,
            eviction,
            state: RwLock::new(LifecycleState::Installing),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read().unwrap()
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.write().unwrap() = state;
        log::info!("Lifecycle state: {:?}", state);
    }

    /// Pre-warm the static-assets partition.
    ///
    /// The critical subset must succeed in full or the install fails
    /// (the host retries it on the next trigger). The remaining curated
    /// list is best-effort: an individual failure is logged and the
    /// batch continues.
    pub async fn install(&self) -> CacheResult<()> {
        log::info!("🗄️ Installing: pre-warming {} ...", PARTITION_STATIC);

        for path in &self.config.precache.critical {
            let request = FetchRequest::get(self.resolve(path)?);
            let response = self.backend
                .fetch(&request).await
                .map_err(|e| CacheError::Install(format!("critical asset {} failed: {}", path, e)))?;
            if !response.ok() {
                return Err(
                    CacheError::Install(
                        format!("critical asset {} returned status {}", path, response.status)
                    )
                );
            }
            let key = CacheKey::new("GET", &request.url);
            self.store.put(PARTITION_STATIC, CacheEntry::capture(&key, &response)).await;
        }

        let critical: HashSet<&String> = self.config.precache.critical.iter().collect();
        let mut warmed = self.config.precache.critical.len();
        for path in &self.config.precache.urls {
            if critical.contains(path) {
                continue;
            }
            let request = match self.resolve(path) {
                Ok(url) => FetchRequest::get(url),
                Err(e) => {
                    log::warn!("Skipping precache entry {}: {}", path, e);
                    continue;
                }
            };
            match self.backend.fetch(&request).await {
                Ok(response) if response.ok() => {
                    let key = CacheKey::new("GET", &request.url);
                    self.store.put(PARTITION_STATIC, CacheEntry::capture(&key, &response)).await;
                    warmed += 1;
                }
                Ok(response) => {
                    log::warn!("Precache {} returned status {}; skipped", path, response.status);
                }
                Err(e) => {
                    log::warn!("Precache {} failed: {}; skipped", path, e);
                }
            }
        }

        log::info!("✅ Install complete: {} assets warmed", warmed);
        self.set_state(LifecycleState::Installed);
        Ok(())
    }

    /// Tear down partitions that are no longer valid, enforce entry
    /// caps on the survivors, and start intercepting fetches - for
    /// already-open clients too, not just future ones. Safe to re-run;
    /// a second pass with no writes in between changes nothing.
    pub async fn activate(&self) -> CacheResult<()> {
        self.set_state(LifecycleState::Activating);

        for name in self.store.partitions().await {
            if !VALID_PARTITIONS.contains(&name.as_str()) {
                self.store.delete_partition(&name).await;
                log::info!("🧹 Tore down obsolete partition {}", name);
            }
        }

        for name in self.store.partitions().await {
            self.eviction.enforce(&*self.store, &name).await;
        }

        self.set_state(LifecycleState::Active);
        log::info!("✅ Active: intercepting fetches for all open clients");
        Ok(())
    }

    /// Route one intercepted request.
    ///
    /// Non-GET traffic and anything arriving before activation passes
    /// straight through to the network, untouched. Active GETs run
    /// Classifier -> StrategyExecutor; when every source fails, a
    /// navigation gets the cached offline page and everything else a
    /// synthesized 503.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> CacheResult<FetchResponse> {
        if !request.is_get() || self.state() != LifecycleState::Active {
            return self.backend.fetch(request).await;
        }

        let classification = self.classifier.classify(request);
        match self.executor.execute(request, &classification).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_unavailable() => {
                log::warn!("All sources failed for {}: {}", request.url, e);
                Ok(self.fallback_response(request).await)
            }
            Err(e) => Err(e),
        }
    }

    /// Offline page for navigations when it was pre-warmed, otherwise
    /// a synthesized 503.
    async fn fallback_response(&self, request: &FetchRequest) -> FetchResponse {
        if request.is_navigation() {
            if let Ok(url) = self.resolve(&self.config.precache.offline_page) {
                let key = CacheKey::new("GET", &url);
                if let Some(entry) = self.store.get(PARTITION_STATIC, &key).await {
                    return entry.to_response();
                }
            }
        }

        FetchResponse::new(SERVICE_UNAVAILABLE_STATUS, SERVICE_UNAVAILABLE_REASON, Vec::new())
    }

    /// Absolute URLs pass through; site-relative paths resolve against
    /// the configured origin
    fn resolve(&self, path: &str) -> CacheResult<Url> {
        if let Ok(url) = Url::parse(path) {
            return Ok(url);
        }
        let base = Url::parse(&self.config.network.base_url).map_err(|e|
            CacheError::Config(format!("invalid base_url {}: {}", self.config.network.base_url, e))
        )?;
        base.join(path).map_err(|e| CacheError::Config(format!("invalid precache path {}: {}", path, e)))
    }
}

/// In-memory partitioned cache store
///
/// Thread-safe, one lock over the partition map. Tracks counters for
/// monitoring.
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::entry::{ CacheEntry, CacheKey };
use super::CacheStore;

/// Store counters for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub deletes: u64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64) / (total as f64)
        }
    }
}

type PartitionMap = HashMap<String, HashMap<CacheKey, CacheEntry>>;

/// Default `CacheStore` implementation: partition -> key -> entry maps
/// behind a single `RwLock`.
pub struct MemoryStore {
    partitions: RwLock<PartitionMap>,
    metrics: RwLock<CacheMetrics>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            metrics: RwLock::new(CacheMetrics::default()),
        }
    }

    /// Current counters snapshot
    pub fn metrics(&self) -> CacheMetrics {
        self.metrics.read().unwrap().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, partition: &str, key: &CacheKey) -> Option<CacheEntry> {
        let partitions = self.partitions.read().unwrap();
        let entry = partitions.get(partition).and_then(|entries| entries.get(key)).cloned();

        let mut metrics = self.metrics.write().unwrap();
        match entry {
            Some(entry) => {
                metrics.hits += 1;
                Some(entry)
            }
            None => {
                metrics.misses += 1;
                None
            }
        }
    }

    async fn put(&self, partition: &str, entry: CacheEntry) {
        let mut partitions = self.partitions.write().unwrap();
        partitions.entry(partition.to_string()).or_default().insert(entry.key.clone(), entry);

        self.metrics.write().unwrap().inserts += 1;
    }

    async fn delete(&self, partition: &str, key: &CacheKey) -> bool {
        let mut partitions = self.partitions.write().unwrap();
        let removed = partitions
            .get_mut(partition)
            .map(|entries| entries.remove(key).is_some())
            .unwrap_or(false);

        if removed {
            self.metrics.write().unwrap().deletes += 1;
        }
        removed
    }

    async fn keys(&self, partition: &str) -> Vec<CacheKey> {
        let partitions = self.partitions.read().unwrap();
        partitions
            .get(partition)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    async fn key_stamps(&self, partition: &str) -> Vec<(CacheKey, i64)> {
        let partitions = self.partitions.read().unwrap();
        partitions
            .get(partition)
            .map(|entries| {
                entries
                    .values()
                    .map(|entry| (entry.key.clone(), entry.inserted_at_epoch_ms))
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn partitions(&self) -> Vec<String> {
        let partitions = self.partitions.read().unwrap();
        partitions.keys().cloned().collect()
    }

    async fn delete_partition(&self, partition: &str) -> bool {
        let mut partitions = self.partitions.write().unwrap();
        partitions.remove(partition).is_some()
    }

    async fn len(&self, partition: &str) -> usize {
        let partitions = self.partitions.read().unwrap();
        partitions
            .get(partition)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchResponse;
    use url::Url;

    fn entry_for(path: &str, body: &str) -> CacheEntry {
        let url = Url::parse(&format!("https://tokensite.io{}", path)).unwrap();
        let key = CacheKey::new("GET", &url);
        CacheEntry::capture(&key, &FetchResponse::new(200, "OK", body.as_bytes().to_vec()))
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        let entry = entry_for("/index.html", "<html>");
        let key = entry.key.clone();

        store.put("static-assets", entry).await;
        let hit = store.get("static-assets", &key).await.unwrap();
        assert_eq!(hit.body, b"<html>");

        assert!(store.delete("static-assets", &key).await);
        assert!(store.get("static-assets", &key).await.is_none());
        assert!(!store.delete("static-assets", &key).await);
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let store = MemoryStore::new();
        let entry = entry_for("/api/price", "{}");
        let key = entry.key.clone();

        store.put("api-cache", entry).await;
        assert!(store.get("api-cache", &key).await.is_some());
        assert!(store.get("runtime-cache", &key).await.is_none());
        assert_eq!(store.len("api-cache").await, 1);
        assert_eq!(store.len("runtime-cache").await, 0);
    }

    #[tokio::test]
    async fn test_put_replaces_wholesale() {
        let store = MemoryStore::new();
        let first = entry_for("/js/app.js", "v1");
        let key = first.key.clone();
        store.put("static-assets", first).await;

        let second = entry_for("/js/app.js", "v2");
        store.put("static-assets", second).await;

        assert_eq!(store.len("static-assets").await, 1);
        assert_eq!(store.get("static-assets", &key).await.unwrap().body, b"v2");
    }

    #[tokio::test]
    async fn test_delete_partition_and_enumeration() {
        let store = MemoryStore::new();
        store.put("api-cache", entry_for("/api/a", "a")).await;
        store.put("v1-leftover", entry_for("/old", "x")).await;

        let mut names = store.partitions().await;
        names.sort();
        assert_eq!(names, vec!["api-cache", "v1-leftover"]);

        assert!(store.delete_partition("v1-leftover").await);
        assert!(!store.delete_partition("v1-leftover").await);
        assert_eq!(store.partitions().await, vec!["api-cache"]);
    }

    #[tokio::test]
    async fn test_metrics_count_hits_and_misses() {
        let store = MemoryStore::new();
        let entry = entry_for("/", "home");
        let key = entry.key.clone();
        store.put("static-assets", entry).await;

        store.get("static-assets", &key).await;
        store.get("static-assets", &CacheKey::new("GET", &Url::parse("https://tokensite.io/nope").unwrap())).await;

        let metrics = store.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.inserts, 1);
        assert!((metrics.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}

use async_trait::async_trait;

pub mod entry;
pub mod eviction;
pub mod store;

pub use entry::{ CacheEntry, CacheKey };
pub use eviction::EvictionManager;
pub use store::{ CacheMetrics, MemoryStore };

/// Named, partitioned key-to-entry storage.
///
/// The store is the only shared mutable state in the service; every
/// mutation is an atomic replace at key granularity. Reads and writes
/// are async suspension points, mirroring the cache surface the site
/// runtime exposes.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up an entry. Missing partition behaves as a miss.
    async fn get(&self, partition: &str, key: &CacheKey) -> Option<CacheEntry>;

    /// Insert or wholesale-replace an entry.
    async fn put(&self, partition: &str, entry: CacheEntry);

    /// Remove one entry; returns whether something was removed.
    async fn delete(&self, partition: &str, key: &CacheKey) -> bool;

    /// All keys currently in a partition.
    async fn keys(&self, partition: &str) -> Vec<CacheKey>;

    /// Keys with their insert stamps, for age-ordered eviction.
    async fn key_stamps(&self, partition: &str) -> Vec<(CacheKey, i64)>;

    /// Names of every partition holding at least one write.
    async fn partitions(&self) -> Vec<String>;

    /// Tear down a whole partition; returns whether it existed.
    async fn delete_partition(&self, partition: &str) -> bool;

    /// Entry count of a partition.
    async fn len(&self, partition: &str) -> usize;
}

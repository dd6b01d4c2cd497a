use super::CacheStore;
use crate::core::config::PartitionSettings;

/// Caps partition entry counts, dropping oldest entries first.
///
/// Runs once per partition at activation. Inserts between activations
/// may transiently push a partition over its cap; that overshoot is
/// accepted and corrected on the next pass.
pub struct EvictionManager {
    settings: PartitionSettings,
}

impl EvictionManager {
    pub fn new(settings: PartitionSettings) -> Self {
        Self { settings }
    }

    /// Trim one partition down to its cap. Returns how many entries
    /// were dropped. Idempotent: a second pass with no writes in
    /// between deletes nothing.
    pub async fn enforce(&self, store: &dyn CacheStore, partition: &str) -> usize {
        let cap = self.settings.cap_for(partition);
        let mut stamps = store.key_stamps(partition).await;
        if stamps.len() <= cap {
            return 0;
        }

        // Oldest first
        stamps.sort_by_key(|(_, inserted_at)| *inserted_at);

        let excess = stamps.len() - cap;
        let mut dropped = 0;
        for (key, _) in stamps.into_iter().take(excess) {
            if store.delete(partition, &key).await {
                dropped += 1;
            }
        }

        if dropped > 0 {
            log::debug!("🧹 Evicted {} oldest entries from {} (cap {})", dropped, partition, cap);
        }
        dropped
    }
}

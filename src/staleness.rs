use chrono::{ DateTime, Utc };
use std::time::Duration;

use crate::cache::CacheEntry;

/// When the response was produced, from its capture-time Date header
pub fn captured_at(entry: &CacheEntry) -> Option<DateTime<Utc>> {
    entry.headers
        .get("date")
        .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whether an entry has outlived its max-age.
///
/// An absent (or unparseable) Date header means the entry is never
/// stale: without timestamp information, forcing a refetch would churn
/// the network for nothing. Explicit policy, not an oversight.
pub fn is_stale(entry: &CacheEntry, max_age: Duration) -> bool {
    match captured_at(entry) {
        Some(captured) => {
            let age_ms = Utc::now().signed_duration_since(captured).num_milliseconds();
            age_ms > (max_age.as_millis() as i64)
        }
        None => false,
    }
}

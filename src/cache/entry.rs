use std::collections::HashMap;
use url::Url;

use crate::fetch::FetchResponse;

/// Cache key: method + normalized URL, plus an optional vary dimension
/// (a request header value, e.g. Accept-Language for localized pages).
/// Unique within a partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(method: &str, url: &Url) -> Self {
        Self::with_vary(method, url, None)
    }

    pub fn with_vary(method: &str, url: &Url, vary: Option<&str>) -> Self {
        // The parser already lowercases scheme and host; the fragment is
        // client-side only and never part of the key.
        let mut normalized = url.clone();
        normalized.set_fragment(None);

        let mut key = format!("{} {}", method.to_uppercase(), normalized);
        if let Some(vary) = vary {
            key.push('|');
            key.push_str(vary);
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One stored response. Immutable once written; an update replaces the
/// entry wholesale.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub status: u16,
    pub status_text: String,
    /// Capture-time headers, names lowercased (the Date header drives
    /// staleness later)
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub inserted_at_epoch_ms: i64,
}

impl CacheEntry {
    /// Snapshot a response into an entry. The body is cloned so the
    /// original response can still be returned to the caller.
    pub fn capture(key: &CacheKey, response: &FetchResponse) -> Self {
        Self {
            key: key.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            body: response.body.clone(),
            inserted_at_epoch_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub(crate) fn with_inserted_at(mut self, epoch_ms: i64) -> Self {
        self.inserted_at_epoch_ms = epoch_ms;
        self
    }

    /// Materialize the entry back into a response, marked as cache-served
    pub fn to_response(&self) -> FetchResponse {
        FetchResponse {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            from_cache: true,
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Network error: {0}")] Network(String),

    #[error("Cache miss: {0}")] CacheMiss(String),

    #[error("Timeout error: network did not settle within {ms} ms")] Timeout {
        ms: u64,
    },

    #[error("Configuration error: {0}")] Config(String),

    #[error("Install error: {0}")] Install(String),

    #[error("HTTP error: {0}")] Http(String),

    #[error("Serialization error: {0}")] Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")] Io(#[from] std::io::Error),
}

impl CacheError {
    /// Whether retrying the operation later could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CacheError::Network(_) => true,
            CacheError::Http(_) => true,
            CacheError::Timeout { .. } => true,
            CacheError::CacheMiss(_) => true,
            _ => false,
        }
    }

    /// Dual-failure errors surface to callers as a synthesized 503.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            CacheError::Network(_) | CacheError::Timeout { .. } | CacheError::CacheMiss(_)
        )
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

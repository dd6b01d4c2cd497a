// Cache partition names
pub const PARTITION_STATIC: &str = "static-assets";
pub const PARTITION_API: &str = "api-cache";
pub const PARTITION_RUNTIME: &str = "runtime-cache";

/// Partitions that survive an activation pass. Anything else is torn down.
pub const VALID_PARTITIONS: [&str; 3] = [PARTITION_STATIC, PARTITION_API, PARTITION_RUNTIME];

// Default max-age per partition
pub const STATIC_MAX_AGE_SECS: u64 = 86_400; // 1 day
pub const API_MAX_AGE_SECS: u64 = 60;
pub const RUNTIME_MAX_AGE_SECS: u64 = 3_600; // 1 hour

// Default partition entry caps (enforced at activation, not per-insert)
pub const STATIC_MAX_ENTRIES: usize = 200;
pub const API_MAX_ENTRIES: usize = 50;
pub const RUNTIME_MAX_ENTRIES: usize = 100;

// Network settings
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RACE_TIMEOUT_MS: u64 = 3_000;

// Token data APIs the site queries
pub const DEXSCREENER_API_HOST: &str = "api.dexscreener.com";
pub const GECKOTERMINAL_API_HOST: &str = "api.geckoterminal.com";
pub const COINGECKO_API_HOST: &str = "api.coingecko.com";

// Offline fallback page served to navigations when every source failed
pub const OFFLINE_PAGE: &str = "/offline.html";

// Synthesized failure response
pub const SERVICE_UNAVAILABLE_STATUS: u16 = 503;
pub const SERVICE_UNAVAILABLE_REASON: &str = "Service Unavailable";

use anyhow::{ Context, Result };
use serde::{ Deserialize, Serialize };
use std::fs;
use std::path::Path;

use crate::classify::{ RuleConfig };
use crate::core::constants::*;

/// Main service configuration
///
/// Every section has a complete default so the service runs with no
/// config file at all. Loaded from JSON, matching the site's other
/// deployment artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Network settings
    pub network: NetworkSettings,

    // Classification settings
    pub classify: ClassifySettings,

    // Pre-warm settings
    pub precache: PrecacheSettings,

    // Partition caps
    pub partitions: PartitionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Site origin that relative precache paths resolve against
    pub base_url: String,
    /// Hard timeout on any single network fetch
    pub request_timeout_secs: u64,
    /// NetworkFirst race window before falling back to cache
    pub race_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifySettings {
    /// Hosts routed NetworkFirst into the api-cache partition
    pub api_domains: Vec<String>,
    /// Paths routed CacheFirst into the static-assets partition
    pub static_assets: Vec<String>,
    /// Operator rules, evaluated ahead of the built-in table
    pub extra_rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecacheSettings {
    /// Best-effort bulk pre-warm list (individual failures are skipped)
    pub urls: Vec<String>,
    /// Must-succeed subset; any failure fails the install
    pub critical: Vec<String>,
    /// Fallback page served to navigations when every source failed
    pub offline_page: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionSettings {
    pub static_max_entries: usize,
    pub api_max_entries: usize,
    pub runtime_max_entries: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            network: NetworkSettings::default(),
            classify: ClassifySettings::default(),
            precache: PrecacheSettings::default(),
            partitions: PartitionSettings::default(),
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            race_timeout_ms: DEFAULT_RACE_TIMEOUT_MS,
        }
    }
}

impl Default for ClassifySettings {
    fn default() -> Self {
        Self {
            api_domains: vec![
                DEXSCREENER_API_HOST.to_string(),
                GECKOTERMINAL_API_HOST.to_string(),
                COINGECKO_API_HOST.to_string()
            ],
            static_assets: default_static_assets(),
            extra_rules: vec![],
        }
    }
}

impl Default for PrecacheSettings {
    fn default() -> Self {
        Self {
            urls: default_static_assets(),
            critical: vec![
                "/".to_string(),
                "/index.html".to_string(),
                OFFLINE_PAGE.to_string()
            ],
            offline_page: OFFLINE_PAGE.to_string(),
        }
    }
}

impl Default for PartitionSettings {
    fn default() -> Self {
        Self {
            static_max_entries: STATIC_MAX_ENTRIES,
            api_max_entries: API_MAX_ENTRIES,
            runtime_max_entries: RUNTIME_MAX_ENTRIES,
        }
    }
}

/// The marketing site's curated asset set
fn default_static_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/offline.html",
        "/css/main.css",
        "/js/app.js",
        "/js/burn-calculator.js",
        "/img/logo.svg",
        "/img/token-hero.webp",
        "/manifest.json",
    ]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl PartitionSettings {
    /// Entry cap for a known partition (unknown names get the runtime cap)
    pub fn cap_for(&self, partition: &str) -> usize {
        match partition {
            PARTITION_STATIC => self.static_max_entries,
            PARTITION_API => self.api_max_entries,
            _ => self.runtime_max_entries,
        }
    }
}

impl SiteConfig {
    /// Read a config file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(&path).with_context(||
            format!("Failed to read config file {}", path.as_ref().display())
        )?;
        let config: SiteConfig = serde_json
            ::from_str(&data)
            .with_context(|| format!("Failed to parse config file {}", path.as_ref().display()))?;
        Ok(config)
    }

    /// Load from a path if given, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_cover_all_sections() {
        let config = SiteConfig::default();
        assert!(!config.classify.api_domains.is_empty());
        assert!(config.precache.urls.contains(&"/index.html".to_string()));
        assert!(config.precache.critical.contains(&OFFLINE_PAGE.to_string()));
        assert_eq!(config.partitions.api_max_entries, API_MAX_ENTRIES);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "network": {{ "race_timeout_ms": 500 }} }}"#).unwrap();

        let config = SiteConfig::load(file.path()).unwrap();
        assert_eq!(config.network.race_timeout_ms, 500);
        // Untouched sections keep their defaults
        assert_eq!(config.network.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.partitions.static_max_entries, STATIC_MAX_ENTRIES);
    }

    #[test]
    fn test_cap_for_unknown_partition_uses_runtime_cap() {
        let partitions = PartitionSettings::default();
        assert_eq!(partitions.cap_for(PARTITION_API), API_MAX_ENTRIES);
        assert_eq!(partitions.cap_for("v1-leftover"), RUNTIME_MAX_ENTRIES);
    }
}

/// Request classification: ordered rule table mapping a GET request to
/// a caching strategy, a partition, and a max-age.
///
/// Rule order (first match wins):
/// 1. operator rules from configuration
/// 2. known API domains        -> NetworkFirst, api-cache, short TTL
/// 3. curated static asset set -> CacheFirst, static-assets, 1 day
/// 4. everything else          -> NetworkFirst, runtime-cache, 1 hour
///
/// Non-GET requests never reach the classifier; the router passes them
/// through untouched.
use serde::{ Deserialize, Serialize };
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::core::config::SiteConfig;
use crate::core::constants::*;
use crate::fetch::FetchRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub strategy: Strategy,
    pub partition: String,
    pub max_age: Duration,
    /// Request header whose value becomes an extra cache-key dimension
    pub vary_header: Option<String>,
}

/// Operator-supplied classification rule. Patterns are substring
/// matches against the full request URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub pattern: String,
    pub strategy: Strategy,
    pub partition: String,
    pub max_age_secs: u64,
    #[serde(default)]
    pub vary_header: Option<String>,
}

pub struct Classifier {
    api_domains: Vec<String>,
    static_assets: HashSet<String>,
    extra_rules: Vec<RuleConfig>,
    /// Host of the site origin; static-asset paths only match there
    origin_host: Option<String>,
}

impl Classifier {
    pub fn new(config: &SiteConfig) -> Self {
        let origin_host = Url::parse(&config.network.base_url)
            .ok()
            .and_then(|url| url.host_str().map(|h| h.to_string()));

        Self {
            api_domains: config.classify.api_domains.clone(),
            static_assets: config.classify.static_assets.iter().cloned().collect(),
            extra_rules: config.classify.extra_rules.clone(),
            origin_host,
        }
    }

    pub fn classify(&self, request: &FetchRequest) -> Classification {
        let url = &request.url;

        // 1. Operator rules, in list order
        let url_str = url.as_str();
        for rule in &self.extra_rules {
            if url_str.contains(&rule.pattern) {
                return Classification {
                    strategy: rule.strategy,
                    partition: rule.partition.clone(),
                    max_age: Duration::from_secs(rule.max_age_secs),
                    vary_header: rule.vary_header.clone(),
                };
            }
        }

        // 2. Token data API hosts
        if let Some(host) = url.host_str() {
            if self.api_domains.iter().any(|domain| domain == host) {
                return Classification {
                    strategy: Strategy::NetworkFirst,
                    partition: PARTITION_API.to_string(),
                    max_age: Duration::from_secs(API_MAX_AGE_SECS),
                    vary_header: None,
                };
            }
        }

        // 3. Curated site assets (same-origin only)
        if self.is_static_asset(url) {
            return Classification {
                strategy: Strategy::CacheFirst,
                partition: PARTITION_STATIC.to_string(),
                max_age: Duration::from_secs(STATIC_MAX_AGE_SECS),
                vary_header: None,
            };
        }

        // 4. Catch-all
        Classification {
            strategy: Strategy::NetworkFirst,
            partition: PARTITION_RUNTIME.to_string(),
            max_age: Duration::from_secs(RUNTIME_MAX_AGE_SECS),
            vary_header: None,
        }
    }

    fn is_static_asset(&self, url: &Url) -> bool {
        let same_origin = match (&self.origin_host, url.host_str()) {
            (Some(origin), Some(host)) => origin == host,
            _ => false,
        };
        same_origin && self.static_assets.contains(url.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        let mut config = SiteConfig::default();
        config.network.base_url = "https://tokensite.io".to_string();
        Classifier::new(&config)
    }

    fn get(url: &str) -> FetchRequest {
        FetchRequest::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_api_domain_goes_network_first_short_ttl() {
        let c = classifier().classify(&get("https://api.dexscreener.com/latest/dex/tokens/x"));
        assert_eq!(c.strategy, Strategy::NetworkFirst);
        assert_eq!(c.partition, PARTITION_API);
        assert_eq!(c.max_age, Duration::from_secs(60));
    }

    #[test]
    fn test_static_asset_goes_cache_first_long_ttl() {
        let c = classifier().classify(&get("https://tokensite.io/css/main.css"));
        assert_eq!(c.strategy, Strategy::CacheFirst);
        assert_eq!(c.partition, PARTITION_STATIC);
        assert_eq!(c.max_age, Duration::from_secs(86_400));
    }

    #[test]
    fn test_unmatched_url_goes_runtime_one_hour() {
        let c = classifier().classify(&get("https://tokensite.io/blog/roadmap"));
        assert_eq!(c.strategy, Strategy::NetworkFirst);
        assert_eq!(c.partition, PARTITION_RUNTIME);
        assert_eq!(c.max_age.as_millis(), 3_600_000);
    }

    #[test]
    fn test_static_paths_do_not_match_foreign_hosts() {
        // Same path as a curated asset, different origin
        let c = classifier().classify(&get("https://evil.example.com/css/main.css"));
        assert_eq!(c.partition, PARTITION_RUNTIME);
    }

    #[test]
    fn test_api_rule_wins_over_static_paths() {
        // Rule order is fixed: API domain check runs before the asset set
        let c = classifier().classify(&get("https://api.coingecko.com/"));
        assert_eq!(c.partition, PARTITION_API);
    }

    #[test]
    fn test_operator_rule_overrides_builtins() {
        let mut config = SiteConfig::default();
        config.network.base_url = "https://tokensite.io".to_string();
        config.classify.extra_rules.push(RuleConfig {
            pattern: "/i18n/".to_string(),
            strategy: Strategy::StaleWhileRevalidate,
            partition: PARTITION_RUNTIME.to_string(),
            max_age_secs: 300,
            vary_header: Some("accept-language".to_string()),
        });
        let classifier = Classifier::new(&config);

        let c = classifier.classify(&get("https://tokensite.io/i18n/strings.json"));
        assert_eq!(c.strategy, Strategy::StaleWhileRevalidate);
        assert_eq!(c.max_age, Duration::from_secs(300));
        assert_eq!(c.vary_header.as_deref(), Some("accept-language"));
    }
}

//! Façade-wide configuration.
//!
//! A single immutable record built once per [`crate::facade::Facade`]
//! instance, replacing the keyword-style dynamic options the original
//! system scattered across call sites (spec.md §9).

use std::env;
use std::time::Duration;

/// Which cache backend a request should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackendKind {
    None,
    #[default]
    Local,
    Shared,
}

impl CacheBackendKind {
    fn from_env_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "local" => Some(Self::Local),
            "shared" => Some(Self::Shared),
            _ => None,
        }
    }
}

/// Process-wide configuration, recognized environment variables listed in
/// spec.md §6. All fields have safe defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub worker_count: usize,
    pub cache_backend: CacheBackendKind,
    pub shared_cache_url: Option<String>,
    pub cache_ttl: Duration,
    pub external_scanner_enabled: bool,
    pub request_deadline: Duration,
    pub merge_channel_capacity: usize,
    pub max_results: usize,
    pub max_file_size: u64,
    pub max_commits_criterion: usize,
    pub max_commits_fuzzy: usize,
    pub max_commits_content_fallback: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            cache_backend: CacheBackendKind::Local,
            shared_cache_url: None,
            cache_ttl: Duration::from_secs(300),
            external_scanner_enabled: true,
            request_deadline: Duration::from_secs(300),
            merge_channel_capacity: 256,
            max_results: 1000,
            max_file_size: 10 * 1024 * 1024,
            max_commits_criterion: 2000,
            max_commits_fuzzy: 1000,
            max_commits_content_fallback: 500,
        }
    }
}

fn default_worker_count() -> usize {
    num_cpus::get().min(4).max(1)
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// [`Config::default`] for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let worker_count = env::var("WORKER_COUNT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v >= 1)
            .unwrap_or(defaults.worker_count);

        let cache_backend = env::var("CACHE_BACKEND")
            .ok()
            .and_then(|v| CacheBackendKind::from_env_str(&v))
            .unwrap_or(defaults.cache_backend);

        let shared_cache_url = env::var("SHARED_CACHE_URL").ok();

        let cache_ttl = env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        let external_scanner_enabled = env::var("EXTERNAL_SCANNER_ENABLED")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(defaults.external_scanner_enabled);

        let request_deadline = env::var("REQUEST_DEADLINE_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_deadline);

        Self {
            worker_count,
            cache_backend,
            shared_cache_url,
            cache_ttl,
            external_scanner_enabled,
            request_deadline,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_worker_count_is_bounded() {
        let cfg = Config::default();
        assert!(cfg.worker_count >= 1 && cfg.worker_count <= 4);
    }

    #[test]
    fn cache_backend_kind_parses_known_values() {
        assert_eq!(CacheBackendKind::from_env_str("Local"), Some(CacheBackendKind::Local));
        assert_eq!(CacheBackendKind::from_env_str("shared"), Some(CacheBackendKind::Shared));
        assert_eq!(CacheBackendKind::from_env_str("none"), Some(CacheBackendKind::None));
        assert_eq!(CacheBackendKind::from_env_str("bogus"), None);
    }
}

//! Environment variable parsing with warn-level logging for invalid values.

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns `default`.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    parse_with_default(var, std::env::var(var).ok().as_deref(), default)
}

/// Read an environment variable as a non-empty trimmed string.
#[must_use]
pub fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    raw: Option<&str>,
    default: T,
) -> T {
    match raw {
        Some(v) => match v.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        None => default,
    }
}

/// Runtime tunables of the dream store.
///
/// Every field has a default matching the reference deployment; `from_env`
/// overrides them from `KEENDREAMS_*` variables.
#[derive(Debug, Clone, PartialEq)]
pub struct DreamsConfig {
    pub storage_limit_bytes: u64,
    pub stats_cache_ttl_secs: u64,
    pub stats_warm_interval_secs: u64,
    pub cleanup_min_quality: u8,
    pub list_page_size: usize,
}

impl Default for DreamsConfig {
    fn default() -> Self {
        Self {
            storage_limit_bytes: crate::DEFAULT_STORAGE_LIMIT_BYTES,
            stats_cache_ttl_secs: crate::DEFAULT_STATS_CACHE_TTL_SECS,
            stats_warm_interval_secs: crate::DEFAULT_STATS_WARM_INTERVAL_SECS,
            cleanup_min_quality: crate::DEFAULT_CLEANUP_MIN_QUALITY,
            list_page_size: crate::DEFAULT_LIST_PAGE_SIZE,
        }
    }
}

impl DreamsConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let list_page_size =
            env_parse_with_default("KEENDREAMS_LIST_PAGE_SIZE", defaults.list_page_size);
        Self {
            storage_limit_bytes: env_parse_with_default(
                "KEENDREAMS_STORAGE_LIMIT_BYTES",
                defaults.storage_limit_bytes,
            ),
            stats_cache_ttl_secs: env_parse_with_default(
                "KEENDREAMS_STATS_CACHE_TTL_SECS",
                defaults.stats_cache_ttl_secs,
            ),
            stats_warm_interval_secs: env_parse_with_default(
                "KEENDREAMS_STATS_WARM_INTERVAL_SECS",
                defaults.stats_warm_interval_secs,
            ),
            cleanup_min_quality: env_parse_with_default(
                "KEENDREAMS_CLEANUP_MIN_QUALITY",
                defaults.cleanup_min_quality,
            )
            .min(100),
            list_page_size: list_page_size.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_value() {
        let result: u32 = parse_with_default("X", Some("42"), 10);
        assert_eq!(result, 42);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let result: u64 = parse_with_default("X", Some(" 300 "), 10);
        assert_eq!(result, 300);
    }

    #[test]
    fn test_parse_invalid_value() {
        let result: u32 = parse_with_default("X", Some("banana"), 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_parse_missing_var() {
        let result: u32 = parse_with_default("X", None, 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_parse_empty_value() {
        let result: u32 = parse_with_default("X", Some(""), 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_env_missing_var_uses_default() {
        let result: u32 = env_parse_with_default("KEENDREAMS_TEST_MISSING_77123", 7);
        assert_eq!(result, 7);
    }

    #[test]
    fn test_default_config_matches_reference_deployment() {
        let config = DreamsConfig::default();
        assert_eq!(config.storage_limit_bytes, 1_073_741_824);
        assert_eq!(config.stats_cache_ttl_secs, 300);
        assert_eq!(config.cleanup_min_quality, 20);
    }
}

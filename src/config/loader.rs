use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{info, warn};
use serde::Deserialize;

use crate::error::{AppError, Context, Result};

use super::{validator, Config, DEFAULT_API_KEY, DEMO_API_KEY};

/// Load the application config, overlaying the JSON file at `path` (when present) on the builtin defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::builtin();

    if path.exists() {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config JSON at {}", path.display()))?;
        let raw: RawConfig = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse config JSON at {}", path.display()))?;
        raw.apply(&mut config);
        info!("Loaded configuration overrides from {}", path.display());
    }

    config.provider.api_key = resolve_api_key(&config.provider.api_key)?;
    validator::validate_config(&config)?;

    Ok(config)
}

/// Expand `${NAME}` placeholders from the process environment.
pub fn expand_env_vars(value: &str) -> Result<String> {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            while let Some(&next) = chars.peek() {
                chars.next();
                if next == '}' {
                    closed = true;
                    break;
                }
                name.push(next);
            }

            if name.is_empty() {
                return Err(AppError::message(
                    "Encountered empty environment placeholder in config value",
                ));
            }

            if !closed {
                return Err(AppError::message(
                    "Unterminated environment placeholder in config value",
                ));
            }

            let value = std::env::var(&name).with_context(|| {
                format!("Environment variable {} required by config is not set", name)
            })?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_api_key(raw: &str) -> Result<String> {
    match expand_env_vars(raw) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) | Err(_) if raw == DEFAULT_API_KEY => {
            warn!("ALPHAVANTAGE_API_KEY is not set; falling back to the demo key");
            Ok(DEMO_API_KEY.to_string())
        }
        Ok(key) => Ok(key),
        Err(err) => Err(err),
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    provider: RawProviderConfig,
    #[serde(default)]
    search: RawSearchConfig,
    #[serde(default)]
    watchlist: RawWatchlistConfig,
    #[serde(default)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct RawProviderConfig {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawSearchConfig {
    debounce_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawWatchlistConfig {
    capacity: Option<usize>,
    file: Option<PathBuf>,
}

impl RawConfig {
    fn apply(self, config: &mut Config) {
        if let Some(base_url) = self.provider.base_url {
            config.provider.base_url = base_url;
        }
        if let Some(api_key) = self.provider.api_key {
            config.provider.api_key = api_key;
        }
        if let Some(timeout_ms) = self.provider.timeout_ms {
            config.provider.request_timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(debounce_ms) = self.search.debounce_ms {
            config.search.debounce = Duration::from_millis(debounce_ms);
        }
        if let Some(capacity) = self.watchlist.capacity {
            config.watchlist.capacity = capacity;
        }
        if let Some(file) = self.watchlist.file {
            config.watchlist.file = file;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = log_file;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "stock-watch-{}-{}.json",
            name,
            std::process::id()
        ));
        fs::write(&path, contents).expect("write temp config");
        path
    }

    #[test]
    fn missing_file_yields_builtin_values() {
        let path = std::env::temp_dir().join("stock-watch-does-not-exist.json");
        let config = load_config(&path).expect("builtin config");

        assert_eq!(config.provider.request_timeout, Duration::from_millis(5_000));
        assert_eq!(config.search.debounce, Duration::from_millis(500));
        assert_eq!(config.watchlist.capacity, 5);
        assert!(!config.provider.api_key.is_empty());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let path = temp_config(
            "overrides",
            r#"{
                "provider": { "api_key": "KEY123", "timeout_ms": 2500 },
                "watchlist": { "file": "custom.json" }
            }"#,
        );

        let config = load_config(&path).expect("config loads");
        fs::remove_file(&path).ok();

        assert_eq!(config.provider.api_key, "KEY123");
        assert_eq!(config.provider.request_timeout, Duration::from_millis(2_500));
        assert_eq!(config.provider.base_url, super::super::DEFAULT_BASE_URL);
        assert_eq!(config.watchlist.file, PathBuf::from("custom.json"));
        assert_eq!(config.search.debounce, Duration::from_millis(500));
    }

    #[test]
    fn rejects_invalid_overrides() {
        let path = temp_config("invalid", r#"{ "search": { "debounce_ms": 0 } }"#);

        let err = load_config(&path).expect_err("zero debounce must be rejected");
        fs::remove_file(&path).ok();

        assert!(
            err.to_string().contains("debounce"),
            "unexpected error message: {err}"
        );
    }

    #[test]
    fn expands_environment_placeholders() {
        std::env::set_var("STOCK_WATCH_TEST_EXPAND", "secret");
        let expanded = expand_env_vars("key-${STOCK_WATCH_TEST_EXPAND}-x").expect("expands");
        assert_eq!(expanded, "key-secret-x");
    }

    #[test]
    fn reports_unterminated_and_missing_placeholders() {
        assert!(expand_env_vars("${UNTERMINATED").is_err());
        assert!(expand_env_vars("${}").is_err());
        assert!(expand_env_vars("${STOCK_WATCH_TEST_SURELY_UNSET}").is_err());
    }

    #[test]
    fn custom_placeholder_must_resolve() {
        let err = resolve_api_key("${STOCK_WATCH_TEST_SURELY_UNSET}")
            .expect_err("custom placeholder should not fall back to demo");
        assert!(err.to_string().contains("STOCK_WATCH_TEST_SURELY_UNSET"));
    }
}

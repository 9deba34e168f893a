use std::path::PathBuf;
use std::time::Duration;

pub mod loader;
pub mod validator;

pub use loader::{expand_env_vars, load_config};
pub use validator::validate_config;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_API_KEY: &str = "${ALPHAVANTAGE_API_KEY}";
/// Key the provider accepts for unauthenticated, heavily rate-limited access.
pub const DEMO_API_KEY: &str = "demo";
pub const DEFAULT_CONFIG_PATH: &str = "stock-watch.json";
pub const CONFIG_PATH_ENV: &str = "STOCK_WATCH_CONFIG";

/// Upstream data provider settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub debounce: Duration,
}

#[derive(Debug, Clone)]
pub struct WatchlistConfig {
    pub capacity: usize,
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub search: SearchConfig,
    pub watchlist: WatchlistConfig,
    pub log_file: PathBuf,
}

impl Config {
    pub fn builtin() -> Self {
        Config {
            provider: ProviderConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                api_key: DEFAULT_API_KEY.to_string(),
                request_timeout: Duration::from_millis(5_000),
            },
            search: SearchConfig {
                debounce: Duration::from_millis(500),
            },
            watchlist: WatchlistConfig {
                capacity: 5,
                file: PathBuf::from("watchlist.json"),
            },
            log_file: PathBuf::from("stock-watch.log"),
        }
    }

    /// Resolve the config file location from `STOCK_WATCH_CONFIG`, falling back to the default name.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

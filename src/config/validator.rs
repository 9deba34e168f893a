use crate::error::{AppError, Result};

use super::{Config, ProviderConfig};

/// Validate a resolved config and surface every problem in one message.
pub fn validate_config(config: &Config) -> Result<()> {
    let mut issues = Vec::new();

    validate_provider(&config.provider, &mut issues);

    if config.search.debounce.is_zero() {
        issues.push("search.debounce_ms must be greater than zero".to_string());
    }

    if config.watchlist.capacity == 0 {
        issues.push("watchlist.capacity must be greater than zero".to_string());
    }

    if config.watchlist.file.as_os_str().is_empty() {
        issues.push("watchlist.file must not be empty".to_string());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "config invalid:\n  - {}",
            issues.join("\n  - ")
        )))
    }
}

fn validate_provider(provider: &ProviderConfig, issues: &mut Vec<String>) {
    let base_url = provider.base_url.trim();
    if base_url.is_empty() {
        issues.push("provider.base_url must not be empty".to_string());
    } else if reqwest::Url::parse(base_url).is_err() {
        issues.push(format!("provider.base_url `{base_url}` is not an absolute URL"));
    }

    if provider.api_key.trim().is_empty() {
        issues.push("provider.api_key must not be empty".to_string());
    }

    if provider.request_timeout.is_zero() {
        issues.push("provider.timeout_ms must be greater than zero".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn resolved_builtin() -> Config {
        let mut config = Config::builtin();
        config.provider.api_key = "demo".to_string();
        config
    }

    #[test]
    fn accepts_builtin_defaults() {
        validate_config(&resolved_builtin()).expect("builtin config should be valid");
    }

    #[test]
    fn rejects_relative_base_url() {
        let mut config = resolved_builtin();
        config.provider.base_url = "/query".to_string();

        let err = validate_config(&config).expect_err("validation should fail");
        assert!(
            err.to_string().contains("absolute URL"),
            "unexpected error message: {err}"
        );
    }

    #[test]
    fn aggregates_every_issue() {
        let mut config = resolved_builtin();
        config.provider.request_timeout = Duration::ZERO;
        config.watchlist.capacity = 0;

        let message = validate_config(&config)
            .expect_err("validation should fail")
            .to_string();
        assert!(message.contains("timeout_ms"), "unexpected: {message}");
        assert!(message.contains("capacity"), "unexpected: {message}");
    }
}

use thiserror::Error;

use super::fallback::is_rate_limit_text;

const TIMEOUT_PHRASES: &[&str] = &["timeout", "timed out"];
const CONFIGURATION_PHRASES: &[&str] = &["invalid"];
const NOT_FOUND_PHRASES: &[&str] = &["not found", "no data"];

/// Failure taxonomy for provider calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request cancelled")]
    Cancelled,
    #[error("request timed out")]
    Timeout,
    #[error("rate limited by provider")]
    RateLimited,
    #[error("provider rejected configuration: {0}")]
    Configuration(String),
    #[error("no matching data")]
    NotFound,
    #[error("provider error: {0}")]
    Upstream(String),
    #[error("{0}")]
    Unknown(String),
}

impl FetchError {
    /// Fixed, user-facing text for this kind of failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Cancelled => "Request cancelled.",
            FetchError::Timeout => "Connection timed out. Please try again.",
            FetchError::RateLimited => "Too many requests. Try again in 1 minute.",
            FetchError::Configuration(_) => "Configuration error. Please contact support.",
            FetchError::NotFound => "Symbol not found. Check your spelling.",
            FetchError::Upstream(_) | FetchError::Unknown(_) => {
                "Something went wrong. Please try again."
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// Map a transport-level failure onto the taxonomy. The first matching rule wins.
pub fn classify_failure(message: &str, status: Option<u16>) -> FetchError {
    let lowered = message.to_lowercase();

    if TIMEOUT_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return FetchError::Timeout;
    }

    if status == Some(429) || is_rate_limit_text(&lowered) {
        return FetchError::RateLimited;
    }

    if CONFIGURATION_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
    {
        return FetchError::Configuration(message.to_string());
    }

    if NOT_FOUND_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return FetchError::NotFound;
    }

    FetchError::Unknown(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_in_priority_order() {
        assert_eq!(
            classify_failure("operation timed out: invalid socket", None),
            FetchError::Timeout
        );
        assert_eq!(
            classify_failure("HTTP 429 Too Many Requests", Some(429)),
            FetchError::RateLimited
        );
        assert_eq!(
            classify_failure("Invalid API call", None),
            FetchError::Configuration("Invalid API call".to_string())
        );
        assert_eq!(
            classify_failure("No data for symbol", None),
            FetchError::NotFound
        );
        assert_eq!(
            classify_failure("HTTP 404 Not Found", Some(404)),
            FetchError::NotFound
        );
        assert_eq!(
            classify_failure("connection reset by peer", None),
            FetchError::Unknown("connection reset by peer".to_string())
        );
    }

    #[test]
    fn status_429_wins_over_generic_text() {
        assert_eq!(
            classify_failure("HTTP 429", Some(429)),
            FetchError::RateLimited
        );
    }

    #[test]
    fn maps_each_kind_to_fixed_message() {
        assert_eq!(
            FetchError::Timeout.user_message(),
            "Connection timed out. Please try again."
        );
        assert_eq!(
            FetchError::RateLimited.user_message(),
            "Too many requests. Try again in 1 minute."
        );
        assert_eq!(
            FetchError::Configuration("x".into()).user_message(),
            "Configuration error. Please contact support."
        );
        assert_eq!(
            FetchError::NotFound.user_message(),
            "Symbol not found. Check your spelling."
        );
        assert_eq!(
            FetchError::Upstream("x".into()).user_message(),
            FetchError::Unknown("y".into()).user_message()
        );
    }
}

use std::fmt;

use futures::future::BoxFuture;
use reqwest::{header::USER_AGENT, Client, StatusCode};

use crate::config::ProviderConfig;
use crate::error::{Context, Result};

use super::{classify_failure, FetchError, FetchResult};

const CLIENT_USER_AGENT: &str = concat!("stock-watch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFunction {
    SymbolSearch,
    GlobalQuote,
}

impl ProviderFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderFunction::SymbolSearch => "SYMBOL_SEARCH",
            ProviderFunction::GlobalQuote => "GLOBAL_QUOTE",
        }
    }

    fn subject_param(self) -> &'static str {
        match self {
            ProviderFunction::SymbolSearch => "keywords",
            ProviderFunction::GlobalQuote => "symbol",
        }
    }
}

/// One provider request: the function to call and the keyword or symbol it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderQuery {
    pub function: ProviderFunction,
    pub subject: String,
}

impl ProviderQuery {
    pub fn search(keyword: &str) -> Self {
        Self {
            function: ProviderFunction::SymbolSearch,
            subject: keyword.to_string(),
        }
    }

    pub fn quote(symbol: &str) -> Self {
        Self {
            function: ProviderFunction::GlobalQuote,
            subject: symbol.to_string(),
        }
    }

    /// Query-string pairs, credential included.
    pub fn params(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("function", self.function.as_str().to_string()),
            (self.function.subject_param(), self.subject.clone()),
            ("apikey", api_key.to_string()),
        ]
    }
}

impl fmt::Display for ProviderQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.function.as_str(), self.subject)
    }
}

/// Fully read provider response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

impl ProviderResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn status_line(&self) -> String {
        let reason = StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("");
        format!("HTTP {} {}", self.status, reason).trim_end().to_string()
    }
}

/// Sends a GET with the given query pairs and reads the whole body.
pub trait Transport: Send + Sync + 'static {
    fn get<'a>(
        &'a self,
        params: &'a [(&'static str, String)],
    ) -> BoxFuture<'a, FetchResult<ProviderResponse>>;
}

/// `reqwest`-backed transport against the configured provider endpoint.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to construct provider HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn get<'a>(
        &'a self,
        params: &'a [(&'static str, String)],
    ) -> BoxFuture<'a, FetchResult<ProviderResponse>> {
        Box::pin(async move {
            let response = self
                .client
                .get(&self.base_url)
                .header(USER_AGENT, CLIENT_USER_AGENT)
                .query(params)
                .send()
                .await
                .map_err(transport_failure)?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(transport_failure)?;

            Ok(ProviderResponse { status, body })
        })
    }
}

fn transport_failure(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }
    classify_failure(&err.to_string(), err.status().map(|status| status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_search_and_quote_params() {
        let search = ProviderQuery::search("micro").params("KEY");
        assert_eq!(
            search,
            vec![
                ("function", "SYMBOL_SEARCH".to_string()),
                ("keywords", "micro".to_string()),
                ("apikey", "KEY".to_string()),
            ]
        );

        let quote = ProviderQuery::quote("MSFT").params("KEY");
        assert_eq!(quote[0].1, "GLOBAL_QUOTE");
        assert_eq!(quote[1], ("symbol", "MSFT".to_string()));
    }

    #[test]
    fn display_omits_credential() {
        let query = ProviderQuery::quote("IBM");
        assert_eq!(query.to_string(), "GLOBAL_QUOTE(IBM)");
    }

    #[test]
    fn status_line_includes_reason() {
        let response = ProviderResponse {
            status: 404,
            body: String::new(),
        };
        assert!(!response.is_success());
        assert_eq!(response.status_line(), "HTTP 404 Not Found");
    }
}

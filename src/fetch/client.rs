use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::ProviderConfig;
use crate::error::Result;

use super::decode::{
    parse_global_quote, parse_payload, parse_search_matches, provider_notice, Quote, SearchResult,
};
use super::fallback::{screen_notice, QuoteMocks, SearchMocks};
use super::request::{HttpTransport, ProviderQuery, Transport};
use super::{classify_failure, FetchError, FetchResult};

/// Remote access to the market data provider: symbol search and single quotes.
///
/// Every call is bounded by the configured timeout and can be abandoned through
/// the caller's [`CancellationToken`]. Rate-limit notices are answered with
/// deterministic mock data rather than an error.
pub struct MarketDataClient<T = HttpTransport> {
    transport: T,
    api_key: String,
    timeout: Duration,
}

impl MarketDataClient<HttpTransport> {
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Ok(Self::new(
            HttpTransport::new(config)?,
            config.api_key.clone(),
            config.request_timeout,
        ))
    }
}

impl<T: Transport> MarketDataClient<T> {
    pub fn new(transport: T, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            timeout,
        }
    }

    pub async fn search(
        &self,
        keyword: &str,
        cancel: &CancellationToken,
    ) -> FetchResult<Vec<SearchResult>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(FetchError::NotFound);
        }

        let payload = self.execute(ProviderQuery::search(keyword), cancel).await?;
        if let Some(outcome) = screen_notice(provider_notice(&payload), keyword, &SearchMocks) {
            return outcome;
        }

        parse_search_matches(&payload)
    }

    pub async fn fetch_quote(&self, symbol: &str, cancel: &CancellationToken) -> FetchResult<Quote> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(FetchError::NotFound);
        }

        let payload = self.execute(ProviderQuery::quote(symbol), cancel).await?;
        if let Some(outcome) = screen_notice(provider_notice(&payload), symbol, &QuoteMocks) {
            return outcome;
        }

        parse_global_quote(&payload)
    }

    async fn execute(&self, query: ProviderQuery, cancel: &CancellationToken) -> FetchResult<Value> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let params = query.params(&self.api_key);
        debug!("Requesting {query}");

        let request = tokio::time::timeout(self.timeout, self.transport.get(&params));
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Abandoned {query}: cancelled");
                return Err(FetchError::Cancelled);
            }
            outcome = request => outcome.unwrap_or(Err(FetchError::Timeout)),
        };

        let response = outcome.map_err(|err| {
            warn!("{query} failed: {err}");
            err
        })?;

        if !response.is_success() {
            let status_line = response.status_line();
            let err = classify_failure(&status_line, Some(response.status));
            warn!("{query} returned {status_line}");
            return Err(err);
        }

        parse_payload(&response.body)
    }
}

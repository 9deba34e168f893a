use log::warn;

use super::decode::{Quote, SearchResult};
use super::{FetchError, FetchResult};

/// Case-insensitive markers the provider uses when a quota or call-rate limit is hit.
pub const RATE_LIMIT_PHRASES: &[&str] = &[
    "thank you for your patience",
    "call frequency",
    "premium",
    "rate limit",
    "too many",
];

const SEARCH_MOCKS: &[(&str, &[(&str, &str)])] = &[
    ("AAPL", &[("AAPL", "Apple Inc.")]),
    ("APPLE", &[("AAPL", "Apple Inc.")]),
    ("MSFT", &[("MSFT", "Microsoft Corporation")]),
    ("MICROSOFT", &[("MSFT", "Microsoft Corporation")]),
    (
        "GOOG",
        &[("GOOGL", "Alphabet Inc. Class A"), ("GOOG", "Alphabet Inc. Class C")],
    ),
    (
        "ALPHABET",
        &[("GOOGL", "Alphabet Inc. Class A"), ("GOOG", "Alphabet Inc. Class C")],
    ),
    ("AMZN", &[("AMZN", "Amazon.com Inc.")]),
    ("AMAZON", &[("AMZN", "Amazon.com Inc.")]),
    ("TSLA", &[("TSLA", "Tesla Inc.")]),
    ("TESLA", &[("TSLA", "Tesla Inc.")]),
    ("NVDA", &[("NVDA", "NVIDIA Corporation")]),
    ("NVIDIA", &[("NVDA", "NVIDIA Corporation")]),
    ("META", &[("META", "Meta Platforms Inc.")]),
    ("IBM", &[("IBM", "International Business Machines Corp.")]),
];

const QUOTE_MOCKS: &[(&str, (&str, &str, &str))] = &[
    ("AAPL", ("228.87", "2.45", "1.08%")),
    ("MSFT", ("415.32", "-3.18", "-0.76%")),
    ("GOOGL", ("167.06", "1.12", "0.67%")),
    ("GOOG", ("168.49", "1.09", "0.65%")),
    ("AMZN", ("186.51", "-0.94", "-0.50%")),
    ("TSLA", ("248.50", "6.72", "2.78%")),
    ("NVDA", ("124.92", "3.35", "2.76%")),
    ("META", ("527.34", "-4.21", "-0.79%")),
    ("IBM", ("214.10", "0.88", "0.41%")),
];

const PLACEHOLDER_QUOTE: (&str, &str, &str) = ("100.00", "+0.50", "+0.50%");

pub fn is_rate_limit_text(text: &str) -> bool {
    let lowered = text.to_lowercase();
    RATE_LIMIT_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

/// Deterministic data substituted for a live response while the provider is throttling us.
pub trait MockStrategy {
    type Output;

    fn substitute(&self, key: &str) -> FetchResult<Self::Output>;
}

/// Canned directory hits, chosen by the first table key that prefixes the keyword.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchMocks;

impl MockStrategy for SearchMocks {
    type Output = Vec<SearchResult>;

    fn substitute(&self, keyword: &str) -> FetchResult<Self::Output> {
        let wanted = keyword.trim().to_uppercase();
        SEARCH_MOCKS
            .iter()
            .find(|(key, _)| wanted.starts_with(key))
            .map(|(_, hits)| {
                hits.iter()
                    .map(|(symbol, name)| SearchResult::new(*symbol, *name))
                    .collect()
            })
            .ok_or(FetchError::NotFound)
    }
}

/// Canned quotes per symbol, with a generic placeholder for anything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteMocks;

impl MockStrategy for QuoteMocks {
    type Output = Quote;

    fn substitute(&self, symbol: &str) -> FetchResult<Self::Output> {
        let wanted = symbol.trim().to_uppercase();
        let (price, change, change_percent) = QUOTE_MOCKS
            .iter()
            .find(|(key, _)| *key == wanted)
            .map(|(_, quote)| *quote)
            .unwrap_or(PLACEHOLDER_QUOTE);
        Ok(Quote::new(price, change, change_percent))
    }
}

/// Screen a parsed payload for provider notices.
///
/// Returns `None` when the payload carries data and should be parsed normally.
/// A rate-limit notice resolves through `strategy`; any other notice becomes
/// [`FetchError::Upstream`] carrying the provider text.
pub fn screen_notice<S: MockStrategy>(
    notice: Option<&str>,
    key: &str,
    strategy: &S,
) -> Option<FetchResult<S::Output>> {
    let notice = notice?;

    if is_rate_limit_text(notice) {
        warn!("Provider rate limit hit for `{key}`; serving mock data");
        return Some(strategy.substitute(key));
    }

    warn!("Provider returned an error notice for `{key}`: {notice}");
    Some(Err(FetchError::Upstream(notice.to_string())))
}

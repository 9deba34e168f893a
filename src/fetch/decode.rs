use serde_json::Value;

use super::{FetchError, FetchResult};

const NOTICE_KEYS: &[&str] = &["Information", "Note", "Error Message"];
const DEFAULT_CHANGE: &str = "0.00";
const DEFAULT_CHANGE_PERCENT: &str = "0.00%";

/// A symbol directory hit. Two results are equal when their symbols are.
#[derive(Debug, Clone, Eq)]
pub struct SearchResult {
    pub symbol: String,
    pub name: String,
}

impl SearchResult {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

/// Latest price for one symbol, with decimal fields already normalized for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub price: String,
    pub change: String,
    pub change_percent: String,
}

impl Quote {
    pub fn new(
        price: impl Into<String>,
        change: impl Into<String>,
        change_percent: impl Into<String>,
    ) -> Self {
        Self {
            price: price.into(),
            change: change.into(),
            change_percent: change_percent.into(),
        }
    }
}

pub fn parse_payload(body: &str) -> FetchResult<Value> {
    serde_json::from_str(body)
        .map_err(|err| FetchError::Unknown(format!("Malformed provider payload: {err}")))
}

/// Text of an informational or error notice, if the payload is one.
pub fn provider_notice(payload: &Value) -> Option<&str> {
    NOTICE_KEYS
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
}

pub fn parse_search_matches(payload: &Value) -> FetchResult<Vec<SearchResult>> {
    let matches = payload
        .get("bestMatches")
        .and_then(Value::as_array)
        .ok_or(FetchError::NotFound)?;

    let results: Vec<SearchResult> = matches
        .iter()
        .filter_map(|entry| {
            let symbol = entry.get("1. symbol").and_then(Value::as_str)?.trim();
            if symbol.is_empty() {
                return None;
            }
            let name = entry
                .get("2. name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim();
            Some(SearchResult::new(symbol, name))
        })
        .collect();

    if results.is_empty() {
        return Err(FetchError::NotFound);
    }

    Ok(results)
}

pub fn parse_global_quote(payload: &Value) -> FetchResult<Quote> {
    let quote = payload
        .get("Global Quote")
        .and_then(Value::as_object)
        .filter(|object| !object.is_empty())
        .ok_or(FetchError::NotFound)?;

    let raw_price = quote
        .get("05. price")
        .and_then(Value::as_str)
        .ok_or(FetchError::NotFound)?;
    let price = normalize_decimal(raw_price)
        .ok_or_else(|| FetchError::Unknown(format!("Malformed price `{raw_price}`")))?;

    let change = quote
        .get("08. change")
        .and_then(Value::as_str)
        .and_then(normalize_decimal)
        .unwrap_or_else(|| DEFAULT_CHANGE.to_string());

    let change_percent = quote
        .get("10. change percent")
        .and_then(Value::as_str)
        .and_then(normalize_percent)
        .unwrap_or_else(|| DEFAULT_CHANGE_PERCENT.to_string());

    Ok(Quote {
        price,
        change,
        change_percent,
    })
}

/// Round a decimal string to two places, e.g. `"228.8700"` to `"228.87"`.
pub fn normalize_decimal(value: &str) -> Option<String> {
    let parsed = value.trim().parse::<f64>().ok()?;
    parsed.is_finite().then(|| format!("{parsed:.2}"))
}

/// Round a percentage string to two places, e.g. `"1.0800%"` to `"1.08%"`.
pub fn normalize_percent(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
    normalize_decimal(number).map(|rounded| format!("{rounded}%"))
}

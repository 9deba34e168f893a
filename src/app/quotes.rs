use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use log::{debug, trace};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::fetch::{FetchResult, HttpTransport, MarketDataClient, Quote, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Fetch state for one watched symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteEntry {
    pub status: QuoteStatus,
    pub quote: Option<Quote>,
    pub error_message: Option<String>,
    pub last_updated_at: Option<DateTime<Local>>,
}

impl QuoteEntry {
    fn loading() -> Self {
        Self {
            status: QuoteStatus::Loading,
            quote: None,
            error_message: None,
            last_updated_at: None,
        }
    }

    /// Apply a fetch outcome. A failure keeps the last good quote in state; the status decides what is shown.
    pub fn resolve(self, outcome: FetchResult<Quote>, at: DateTime<Local>) -> Self {
        match outcome {
            Ok(quote) => Self {
                status: QuoteStatus::Success,
                quote: Some(quote),
                error_message: None,
                last_updated_at: Some(at),
            },
            Err(err) => Self {
                status: QuoteStatus::Error,
                error_message: Some(err.user_message().to_string()),
                ..self
            },
        }
    }

    /// Seconds elapsed since the last successful update, if there was one.
    pub fn seconds_since_update(&self, now: DateTime<Local>) -> Option<i64> {
        self.last_updated_at
            .map(|at| (now - at).num_seconds().max(0))
    }
}

/// Result of one quote request, delivered back to the board that issued it.
#[derive(Debug, Clone)]
pub struct QuoteCompletion {
    pub symbol: String,
    pub seq: u64,
    pub outcome: FetchResult<Quote>,
    pub completed_at: DateTime<Local>,
}

struct Tracked {
    entry: QuoteEntry,
    latest_seq: u64,
    in_flight: Option<CancellationToken>,
}

/// Per-symbol quote lifecycle for the watchlist.
///
/// Each symbol is fetched by its own task; completions come back over a channel
/// and are applied by [`QuoteBoard::apply`]. A completion only lands when it
/// answers the latest request for a still-tracked symbol, so a slow older
/// response can never overwrite a newer one.
pub struct QuoteBoard<T = HttpTransport> {
    client: Arc<MarketDataClient<T>>,
    order: Vec<String>,
    tracked: HashMap<String, Tracked>,
    next_seq: u64,
    completions_tx: mpsc::UnboundedSender<QuoteCompletion>,
    completions_rx: mpsc::UnboundedReceiver<QuoteCompletion>,
    cancel: CancellationToken,
}

impl<T: Transport> QuoteBoard<T> {
    pub fn new(client: Arc<MarketDataClient<T>>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            client,
            order: Vec::new(),
            tracked: HashMap::new(),
            next_seq: 0,
            completions_tx,
            completions_rx,
            cancel: CancellationToken::new(),
        }
    }

    /// Reconcile with the watchlist: start fetching new symbols and drop removed ones.
    pub fn sync(&mut self, symbols: &[String]) {
        let removed: Vec<String> = self
            .tracked
            .keys()
            .filter(|symbol| !symbols.contains(symbol))
            .cloned()
            .collect();
        for symbol in removed {
            if let Some(tracked) = self.tracked.remove(&symbol) {
                if let Some(token) = tracked.in_flight {
                    token.cancel();
                }
                debug!("Stopped tracking {symbol}");
            }
        }

        self.order = symbols.to_vec();
        for symbol in symbols {
            if !self.tracked.contains_key(symbol) {
                self.request(symbol);
            }
        }
    }

    /// Re-fetch one tracked symbol. Returns `false` when the symbol is not tracked.
    pub fn refresh(&mut self, symbol: &str) -> bool {
        if !self.tracked.contains_key(symbol) {
            return false;
        }
        self.request(symbol);
        true
    }

    pub fn refresh_all(&mut self) {
        for symbol in self.order.clone() {
            self.request(&symbol);
        }
    }

    fn request(&mut self, symbol: &str) {
        // Board-wide so a removed and re-added symbol never reuses a number.
        self.next_seq += 1;
        let seq = self.next_seq;
        let token = self.cancel.child_token();
        let tracked = self
            .tracked
            .entry(symbol.to_string())
            .or_insert_with(|| Tracked {
                entry: QuoteEntry::loading(),
                latest_seq: 0,
                in_flight: None,
            });

        tracked.latest_seq = seq;
        tracked.entry.status = QuoteStatus::Loading;
        if let Some(previous) = tracked.in_flight.replace(token.clone()) {
            previous.cancel();
        }

        let symbol = symbol.to_string();
        let client = Arc::clone(&self.client);
        let completions = self.completions_tx.clone();
        trace!("Issuing quote request #{seq} for {symbol}");

        tokio::spawn(async move {
            let outcome = client.fetch_quote(&symbol, &token).await;
            let _ = completions.send(QuoteCompletion {
                symbol,
                seq,
                outcome,
                completed_at: Local::now(),
            });
        });
    }

    /// Wait for the next finished request. Pair with [`QuoteBoard::apply`].
    pub async fn next_completion(&mut self) -> Option<QuoteCompletion> {
        self.completions_rx.recv().await
    }

    /// Apply a completion to its symbol's entry. Returns `false` when it was discarded.
    pub fn apply(&mut self, completion: QuoteCompletion) -> bool {
        let QuoteCompletion {
            symbol,
            seq,
            outcome,
            completed_at,
        } = completion;

        let Some(tracked) = self.tracked.get_mut(&symbol) else {
            trace!("Discarding quote for untracked {symbol}");
            return false;
        };

        if seq != tracked.latest_seq {
            trace!(
                "Discarding superseded quote #{seq} for {symbol} (latest #{})",
                tracked.latest_seq
            );
            return false;
        }

        if matches!(&outcome, Err(err) if err.is_cancelled()) {
            return false;
        }

        if let Err(err) = &outcome {
            debug!("Quote for {symbol} failed: {err}");
        }

        tracked.in_flight = None;
        let entry = std::mem::replace(&mut tracked.entry, QuoteEntry::loading());
        tracked.entry = entry.resolve(outcome, completed_at);
        true
    }

    pub fn entry(&self, symbol: &str) -> Option<&QuoteEntry> {
        self.tracked.get(symbol).map(|tracked| &tracked.entry)
    }

    pub fn status(&self, symbol: &str) -> QuoteStatus {
        self.entry(symbol)
            .map(|entry| entry.status)
            .unwrap_or(QuoteStatus::Idle)
    }

    /// Entries in watchlist order.
    pub fn rows(&self) -> Vec<(&str, &QuoteEntry)> {
        self.order
            .iter()
            .filter_map(|symbol| {
                self.tracked
                    .get(symbol)
                    .map(|tracked| (symbol.as_str(), &tracked.entry))
            })
            .collect()
    }

    /// Cancel every in-flight request.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl<T> Drop for QuoteBoard<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::ScriptedTransport;
    use crate::fetch::FetchError;
    use serde_json::json;
    use std::time::Duration;

    fn board(transport: &ScriptedTransport) -> QuoteBoard<ScriptedTransport> {
        QuoteBoard::new(Arc::new(MarketDataClient::new(
            transport.clone(),
            "test-key",
            Duration::from_millis(5_000),
        )))
    }

    fn quote_body(price: &str) -> serde_json::Value {
        json!({ "Global Quote": {
            "05. price": price,
            "08. change": "1.0000",
            "10. change percent": "0.5000%"
        }})
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|symbol| symbol.to_string()).collect()
    }

    async fn drain(board: &mut QuoteBoard<ScriptedTransport>, count: usize) {
        for _ in 0..count {
            let completion = board.next_completion().await.expect("completion");
            board.apply(completion);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn symbols_resolve_independently() {
        let transport = ScriptedTransport::new();
        transport.fail("AAPL", Duration::from_millis(50), FetchError::Unknown("boom".into()));
        transport.respond("MSFT", Duration::from_millis(100), quote_body("415.3200"));

        let mut board = board(&transport);
        board.sync(&symbols(&["AAPL", "MSFT"]));
        assert_eq!(board.status("AAPL"), QuoteStatus::Loading);
        assert_eq!(board.status("MSFT"), QuoteStatus::Loading);

        drain(&mut board, 1).await;
        assert_eq!(board.status("AAPL"), QuoteStatus::Error);
        assert_eq!(board.status("MSFT"), QuoteStatus::Loading);

        drain(&mut board, 1).await;
        assert_eq!(board.status("AAPL"), QuoteStatus::Error);
        assert_eq!(board.status("MSFT"), QuoteStatus::Success);

        let aapl = board.entry("AAPL").unwrap();
        assert_eq!(
            aapl.error_message.as_deref(),
            Some("Something went wrong. Please try again.")
        );
        let msft = board.entry("MSFT").unwrap();
        assert_eq!(msft.quote, Some(Quote::new("415.32", "1.00", "0.50%")));
        assert!(msft.last_updated_at.is_some());
        assert!(msft.error_message.is_none());
    }

    #[tokio::test]
    async fn rate_limited_quote_lands_as_success() {
        let transport = ScriptedTransport::new();
        transport.respond(
            "AAPL",
            Duration::ZERO,
            json!({ "Information": "... call frequency ..." }),
        );

        let mut board = board(&transport);
        board.sync(&symbols(&["AAPL"]));
        drain(&mut board, 1).await;

        let entry = board.entry("AAPL").unwrap();
        assert_eq!(entry.status, QuoteStatus::Success);
        assert_eq!(entry.quote, Some(Quote::new("228.87", "2.45", "1.08%")));
    }

    #[tokio::test]
    async fn sync_drops_removed_symbols_and_ignores_their_late_results() {
        let transport = ScriptedTransport::new();
        transport.respond("IBM", Duration::ZERO, quote_body("214.1"));

        let mut board = board(&transport);
        board.sync(&symbols(&["IBM"]));
        board.sync(&[]);

        assert_eq!(board.status("IBM"), QuoteStatus::Idle);
        assert!(board.rows().is_empty());

        let applied = board.apply(QuoteCompletion {
            symbol: "IBM".to_string(),
            seq: 1,
            outcome: Ok(Quote::new("1.00", "0.00", "0.00%")),
            completed_at: Local::now(),
        });
        assert!(!applied);
        assert_eq!(board.status("IBM"), QuoteStatus::Idle);
    }

    #[tokio::test]
    async fn superseded_completion_is_discarded() {
        let transport = ScriptedTransport::new();
        transport.respond("NVDA", Duration::ZERO, quote_body("124.92"));

        let mut board = board(&transport);
        board.sync(&symbols(&["NVDA"]));
        assert!(board.refresh("NVDA"));

        let stale = QuoteCompletion {
            symbol: "NVDA".to_string(),
            seq: 1,
            outcome: Err(FetchError::Timeout),
            completed_at: Local::now(),
        };
        assert!(!board.apply(stale));
        assert_eq!(board.status("NVDA"), QuoteStatus::Loading);

        let mut landed = false;
        while !landed {
            let completion = board.next_completion().await.expect("completion");
            landed = board.apply(completion);
        }
        assert_eq!(board.status("NVDA"), QuoteStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_from_before_removal_does_not_land_after_re_add() {
        let transport = ScriptedTransport::new();
        transport.respond("IBM", Duration::ZERO, quote_body("1.00"));

        let mut board = board(&transport);
        board.sync(&symbols(&["IBM"]));
        tokio::time::sleep(Duration::from_millis(10)).await;
        board.sync(&[]);

        transport.respond("IBM", Duration::from_millis(100), quote_body("214.10"));
        board.sync(&symbols(&["IBM"]));

        let stale = board.next_completion().await.expect("queued completion");
        assert!(stale.outcome.is_ok());
        assert!(!board.apply(stale));
        assert_eq!(board.status("IBM"), QuoteStatus::Loading);

        let fresh = board.next_completion().await.expect("fresh completion");
        assert!(board.apply(fresh));
        let entry = board.entry("IBM").unwrap();
        assert_eq!(entry.status, QuoteStatus::Success);
        assert_eq!(entry.quote.as_ref().map(|q| q.price.as_str()), Some("214.10"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_quote_in_state() {
        let transport = ScriptedTransport::new();
        transport.respond("TSLA", Duration::ZERO, quote_body("248.5"));

        let mut board = board(&transport);
        board.sync(&symbols(&["TSLA"]));
        drain(&mut board, 1).await;

        transport.respond("TSLA", Duration::ZERO, json!({ "Global Quote": {} }));
        board.refresh_all();
        drain(&mut board, 1).await;

        let entry = board.entry("TSLA").unwrap();
        assert_eq!(entry.status, QuoteStatus::Error);
        assert_eq!(
            entry.error_message.as_deref(),
            Some("Symbol not found. Check your spelling.")
        );
        assert_eq!(entry.quote.as_ref().map(|q| q.price.as_str()), Some("248.50"));
    }

    #[test]
    fn refresh_of_untracked_symbol_is_rejected() {
        let transport = ScriptedTransport::new();
        let mut board = board(&transport);
        assert!(!board.refresh("AAPL"));
    }

    #[test]
    fn reports_seconds_since_update() {
        let at = Local::now();
        let entry = QuoteEntry::loading().resolve(Ok(Quote::new("1.00", "0.00", "0.00%")), at);
        let later = at + chrono::Duration::seconds(42);
        assert_eq!(entry.seconds_since_update(later), Some(42));
    }
}

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::fetch::{FetchError, FetchResult, MarketDataClient, SearchResult, Transport};

/// What the presentation layer sees of the search box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSnapshot {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub error: Option<String>,
    pub searching: bool,
}

enum SearchCommand {
    Input(String),
    Shutdown,
}

/// Cloneable handle to a running search controller.
///
/// The controller stops, cancelling any pending or in-flight search, on
/// [`SearchHandle::shutdown`] or once every handle has been dropped.
#[derive(Clone)]
pub struct SearchHandle {
    commands: mpsc::UnboundedSender<SearchCommand>,
    snapshots: watch::Receiver<SearchSnapshot>,
}

impl SearchHandle {
    /// Report the full current contents of the search box.
    pub fn input(&self, raw: impl Into<String>) {
        let _ = self.commands.send(SearchCommand::Input(raw.into()));
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(SearchCommand::Shutdown);
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.snapshots.clone()
    }
}

/// Start a debounced search controller on the current runtime.
pub fn spawn_search<T: Transport>(
    client: Arc<MarketDataClient<T>>,
    debounce: Duration,
) -> SearchHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(SearchSnapshot::default());

    let controller = SearchController {
        client,
        debounce,
        session: SearchSession::default(),
        commands: commands_rx,
        snapshots: snapshot_tx,
    };
    tokio::spawn(controller.run());

    SearchHandle {
        commands: commands_tx,
        snapshots: snapshot_rx,
    }
}

struct PendingSearch {
    deadline: Instant,
    query: String,
}

struct InFlightSearch {
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<FetchResult<Vec<SearchResult>>>,
}

/// The single live query slot: at most one armed timer and one in-flight call.
#[derive(Default)]
struct SearchSession {
    raw_input: String,
    generation: u64,
    pending: Option<PendingSearch>,
    in_flight: Option<InFlightSearch>,
}

impl SearchSession {
    fn cancel_in_flight(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            trace!("Cancelling in-flight search #{}", flight.generation);
            flight.cancel.cancel();
        }
    }

    fn teardown(&mut self) {
        self.pending = None;
        if let Some(flight) = self.in_flight.take() {
            flight.cancel.cancel();
            flight.task.abort();
        }
    }
}

struct SearchController<T> {
    client: Arc<MarketDataClient<T>>,
    debounce: Duration,
    session: SearchSession,
    commands: mpsc::UnboundedReceiver<SearchCommand>,
    snapshots: watch::Sender<SearchSnapshot>,
}

impl<T: Transport> SearchController<T> {
    async fn run(mut self) {
        loop {
            let deadline = self.session.pending.as_ref().map(|pending| pending.deadline);

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SearchCommand::Input(raw)) => self.on_input(raw),
                    Some(SearchCommand::Shutdown) | None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_settled();
                }
                (generation, outcome) = join_in_flight(&mut self.session.in_flight) => {
                    self.on_completed(generation, outcome);
                }
            }
        }

        debug!("Search controller shutting down");
        self.session.teardown();
    }

    fn on_input(&mut self, raw: String) {
        let query = raw.trim().to_string();
        self.session.raw_input = raw;
        self.session.generation += 1;
        self.session.pending = None;

        if query.is_empty() {
            self.session.cancel_in_flight();
            let raw_input = self.session.raw_input.clone();
            self.publish(|snapshot| {
                snapshot.query = raw_input;
                snapshot.results.clear();
                snapshot.error = None;
            });
            return;
        }

        self.session.pending = Some(PendingSearch {
            deadline: Instant::now() + self.debounce,
            query,
        });
        let raw_input = self.session.raw_input.clone();
        self.publish(|snapshot| snapshot.query = raw_input);
    }

    fn on_settled(&mut self) {
        let Some(PendingSearch { query, .. }) = self.session.pending.take() else {
            return;
        };

        self.session.cancel_in_flight();

        let generation = self.session.generation;
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let client = Arc::clone(&self.client);
        debug!("Searching for `{query}` (#{generation})");

        let task = tokio::spawn(async move { client.search(&query, &token).await });
        self.session.in_flight = Some(InFlightSearch {
            generation,
            cancel,
            task,
        });
        self.publish(|_| {});
    }

    fn on_completed(&mut self, generation: u64, outcome: FetchResult<Vec<SearchResult>>) {
        self.session.in_flight = None;

        if generation != self.session.generation {
            trace!(
                "Discarding search #{generation}; input moved on to #{}",
                self.session.generation
            );
            self.publish(|_| {});
            return;
        }

        match outcome {
            Ok(results) => self.publish(|snapshot| {
                snapshot.results = results;
                snapshot.error = None;
            }),
            Err(FetchError::Cancelled) => self.publish(|_| {}),
            Err(err) => {
                debug!("Search #{generation} failed: {err}");
                self.publish(|snapshot| {
                    snapshot.results.clear();
                    snapshot.error = Some(err.user_message().to_string());
                });
            }
        }
    }

    fn publish(&self, update: impl FnOnce(&mut SearchSnapshot)) {
        let searching = self.session.in_flight.is_some();
        self.snapshots.send_modify(|snapshot| {
            update(snapshot);
            snapshot.searching = searching;
        });
    }
}

async fn join_in_flight(
    in_flight: &mut Option<InFlightSearch>,
) -> (u64, FetchResult<Vec<SearchResult>>) {
    let Some(flight) = in_flight.as_mut() else {
        return std::future::pending().await;
    };

    let outcome = match (&mut flight.task).await {
        Ok(outcome) => outcome,
        Err(err) => Err(FetchError::Unknown(format!("search task failed: {err}"))),
    };
    (flight.generation, outcome)
}

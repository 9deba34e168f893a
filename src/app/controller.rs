use std::time::Duration;

use chrono::Local;
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use log::{debug, warn};
use tokio::time::{interval, MissedTickBehavior};

use crate::app::state::WatchState;
use crate::error::Result;
use crate::fetch::{HttpTransport, Transport};
use crate::records::AddOutcome;
use crate::ui::{ScreenAction, TerminalGuard, WatchScreen};

const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Drives the watch screen: terminal events, quote completions, search
/// snapshots, and a clock tick for the "updated" ages.
pub struct AppController<T = HttpTransport> {
    state: WatchState<T>,
    screen: WatchScreen,
}

enum ControllerOutcome {
    Continue,
    Exit,
}

impl<T: Transport> AppController<T> {
    pub fn new(state: WatchState<T>) -> Self {
        Self {
            state,
            screen: WatchScreen::new(),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut guard = TerminalGuard::enter()?;
        let mut events = EventStream::new();
        let mut snapshots = self.state.search().subscribe();
        let mut tick = interval(CLOCK_TICK);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let outcome = loop {
            let snapshot = self.state.search().snapshot();
            let rows = self.state.rows();
            let now = Local::now();
            guard.draw(|frame| self.screen.render(frame, &snapshot, &rows, now))?;
            drop(rows);

            tokio::select! {
                event = events.next() => match event {
                    Some(Ok(Event::Key(key))) => {
                        let watchlist = self.state.watchlist().symbols().to_vec();
                        if let Some(action) = self.screen.handle_key(key, &snapshot.results, &watchlist) {
                            if let ControllerOutcome::Exit = self.handle_action(action) {
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => break Err(err.into()),
                    None => break Ok(()),
                },
                Some(completion) = self.state.next_completion() => {
                    self.state.apply(completion);
                }
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        debug!("Search controller stopped");
                        break Ok(());
                    }
                }
                _ = tick.tick() => {}
            }
        };

        self.state.shutdown();
        guard.restore()?;
        outcome
    }

    fn handle_action(&mut self, action: ScreenAction) -> ControllerOutcome {
        match action {
            ScreenAction::QueryChanged(query) => self.state.search().input(query),
            ScreenAction::Add(symbol) => self.add(&symbol),
            ScreenAction::Remove(symbol) => match self.state.remove_symbol(&symbol) {
                Ok(true) => self.screen.set_status(format!("Removed {symbol}.")),
                Ok(false) => {}
                Err(err) => {
                    warn!("Failed to persist watchlist after removing {symbol}: {err}");
                    self.screen
                        .set_status(format!("Could not save watchlist: {err}"));
                }
            },
            ScreenAction::Refresh(symbol) => {
                if self.state.refresh(&symbol) {
                    self.screen.set_status(format!("Refreshing {symbol}…"));
                }
            }
            ScreenAction::RefreshAll => {
                self.state.refresh_all();
                self.screen.set_status("Refreshing all quotes…");
            }
            ScreenAction::Quit => return ControllerOutcome::Exit,
        }
        ControllerOutcome::Continue
    }

    fn add(&mut self, symbol: &str) {
        match self.state.add_symbol(symbol) {
            Ok(AddOutcome::Added) => self.screen.set_status(format!("Added {symbol}.")),
            Ok(AddOutcome::Duplicate) => self
                .screen
                .set_status(format!("{symbol} is already on the watchlist.")),
            Ok(AddOutcome::Full) => self.screen.set_status(format!(
                "Watchlist is full ({} symbols). Remove one first.",
                self.state.watchlist().capacity()
            )),
            Err(err) => {
                warn!("Failed to persist watchlist after adding {symbol}: {err}");
                self.screen
                    .set_status(format!("Could not save watchlist: {err}"));
            }
        }
    }
}

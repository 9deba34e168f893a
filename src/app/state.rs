use std::sync::Arc;

use log::info;

use crate::app::quotes::{QuoteBoard, QuoteCompletion, QuoteEntry};
use crate::app::search::{spawn_search, SearchHandle};
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{HttpTransport, MarketDataClient, Transport};
use crate::records::{AddOutcome, WatchlistStore};

/// Runtime data shared by the watch screen: the persisted watchlist, the quote
/// board tracking it, and the search controller handle.
pub struct WatchState<T = HttpTransport> {
    watchlist: WatchlistStore,
    board: QuoteBoard<T>,
    search: SearchHandle,
}

impl<T: Transport> WatchState<T> {
    /// Load the watchlist, start the search controller, and request quotes for every saved symbol.
    pub fn new(config: &Config, client: Arc<MarketDataClient<T>>) -> Result<Self> {
        let watchlist =
            WatchlistStore::load(&config.watchlist.file, config.watchlist.capacity)?;
        let search = spawn_search(Arc::clone(&client), config.search.debounce);
        let mut board = QuoteBoard::new(client);
        board.sync(watchlist.symbols());
        info!(
            "Watching {} of {} symbols from {:?}",
            watchlist.symbols().len(),
            watchlist.capacity(),
            watchlist.path()
        );

        Ok(Self {
            watchlist,
            board,
            search,
        })
    }

    pub fn watchlist(&self) -> &WatchlistStore {
        &self.watchlist
    }

    pub fn board(&self) -> &QuoteBoard<T> {
        &self.board
    }

    pub fn search(&self) -> &SearchHandle {
        &self.search
    }

    pub fn rows(&self) -> Vec<(&str, &QuoteEntry)> {
        self.board.rows()
    }

    /// Add a symbol to the watchlist. Only an accepted symbol is persisted and fetched.
    pub fn add_symbol(&mut self, symbol: &str) -> Result<AddOutcome> {
        let outcome = self.watchlist.add(symbol);
        if outcome == AddOutcome::Added {
            self.watchlist.save()?;
            self.board.sync(self.watchlist.symbols());
            info!("Added {symbol} to the watchlist");
        }
        Ok(outcome)
    }

    pub fn remove_symbol(&mut self, symbol: &str) -> Result<bool> {
        if !self.watchlist.remove(symbol) {
            return Ok(false);
        }
        self.watchlist.save()?;
        self.board.sync(self.watchlist.symbols());
        info!("Removed {symbol} from the watchlist");
        Ok(true)
    }

    pub fn refresh(&mut self, symbol: &str) -> bool {
        self.board.refresh(symbol)
    }

    pub fn refresh_all(&mut self) {
        self.board.refresh_all();
    }

    pub async fn next_completion(&mut self) -> Option<QuoteCompletion> {
        self.board.next_completion().await
    }

    pub fn apply(&mut self, completion: QuoteCompletion) -> bool {
        self.board.apply(completion)
    }

    /// Stop the search controller and cancel every outstanding quote request.
    pub fn shutdown(&self) {
        self.search.shutdown();
        self.board.shutdown();
    }
}

pub mod watchlist;

pub use watchlist::{AddOutcome, WatchlistStore};

pub mod bootstrap;
pub mod controller;
pub mod quotes;
pub mod search;
pub mod state;

pub use bootstrap::run;
pub use quotes::{QuoteBoard, QuoteEntry, QuoteStatus};
pub use search::{spawn_search, SearchHandle, SearchSnapshot};
pub use state::WatchState;

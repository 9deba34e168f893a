pub mod watch;

pub use watch::{Focus, ScreenAction, WatchScreen};

pub mod table;
pub mod terminal;

pub use table::quote_table;
pub use terminal::TerminalGuard;

pub mod logging;
pub mod time;

pub use logging::init_file_logger;
pub use time::{format_age, format_clock};

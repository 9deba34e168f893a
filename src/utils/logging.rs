use std::fs::OpenOptions;
use std::path::Path;

use env_logger::{Builder, Env, Target, WriteStyle};

use crate::error::{AppError, Context, Result};

/// Route `log` output to `path` so it never draws over the terminal UI.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_file_logger(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .write_style(WriteStyle::Never)
        .format_timestamp_millis()
        .try_init()
        .map_err(|err| AppError::message(format!("Failed to initialise logger: {err}")))
}

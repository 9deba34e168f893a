use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Context, Result};

/// Outcome of [`WatchlistStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
    Full,
}

/// Ordered, bounded list of watched symbols persisted as a JSON string array.
#[derive(Debug, Clone)]
pub struct WatchlistStore {
    path: PathBuf,
    capacity: usize,
    symbols: Vec<String>,
}

impl WatchlistStore {
    /// Load the list stored at `path`. A missing file yields an empty list.
    pub fn load(path: impl Into<PathBuf>, capacity: usize) -> Result<Self> {
        let path = path.into();
        let mut symbols: Vec<String> = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read watchlist file {:?}", path))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse watchlist file {:?}", path))?
        } else {
            Vec::new()
        };

        let mut seen = HashSet::new();
        symbols.retain(|symbol| seen.insert(symbol.clone()));
        symbols.truncate(capacity);
        debug!("Loaded {} watched symbols from {:?}", symbols.len(), path);

        Ok(Self {
            path,
            capacity,
            symbols,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.symbols.len() >= self.capacity
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|existing| existing == symbol)
    }

    pub fn add(&mut self, symbol: &str) -> AddOutcome {
        if self.contains(symbol) {
            return AddOutcome::Duplicate;
        }
        if self.is_full() {
            return AddOutcome::Full;
        }
        self.symbols.push(symbol.to_string());
        AddOutcome::Added
    }

    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.symbols.len();
        self.symbols.retain(|existing| existing != symbol);
        self.symbols.len() != before
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the current list, creating the parent directory if needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create watchlist directory {:?}", parent)
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&self.symbols)
            .context("Failed to serialize watchlist")?;
        let mut file = fs::File::create(&self.path)
            .with_context(|| format!("Failed to create watchlist file {:?}", self.path))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write watchlist file {:?}", self.path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "stock-watch-watchlist-{}-{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn rejects_duplicates_and_overflow() {
        let mut store = WatchlistStore::load(temp_path("absent"), 2).expect("empty store");
        assert!(store.symbols().is_empty());

        assert_eq!(store.add("AAPL"), AddOutcome::Added);
        assert_eq!(store.add("AAPL"), AddOutcome::Duplicate);
        assert_eq!(store.add("MSFT"), AddOutcome::Added);
        assert_eq!(store.add("TSLA"), AddOutcome::Full);
        assert_eq!(store.symbols(), ["AAPL".to_string(), "MSFT".to_string()]);
    }

    #[test]
    fn duplicate_check_is_exact() {
        let mut store = WatchlistStore::load(temp_path("exact"), 5).expect("empty store");
        assert_eq!(store.add("aapl"), AddOutcome::Added);
        assert_eq!(store.add("AAPL"), AddOutcome::Added);
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let mut store = WatchlistStore::load(temp_path("remove"), 5).expect("empty store");
        store.add("AAPL");
        assert!(store.remove("AAPL"));
        assert!(!store.remove("AAPL"));
    }

    #[test]
    fn round_trips_through_disk() {
        let path = temp_path("persist");
        let mut store = WatchlistStore::load(&path, 5).expect("empty store");
        store.add("NVDA");
        store.add("IBM");
        store.save().expect("save watchlist");

        let reloaded = WatchlistStore::load(&path, 5).expect("reload watchlist");
        fs::remove_file(&path).ok();

        assert_eq!(reloaded.symbols(), ["NVDA".to_string(), "IBM".to_string()]);
    }

    #[test]
    fn truncates_persisted_list_to_capacity() {
        let path = temp_path("truncate");
        fs::write(&path, r#"["A", "B", "C"]"#).expect("seed file");

        let store = WatchlistStore::load(&path, 2).expect("load watchlist");
        fs::remove_file(&path).ok();

        assert_eq!(store.symbols().len(), 2);
    }
}

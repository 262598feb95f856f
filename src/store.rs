//! Persisted record of what was last posted per symbol

use crate::{error::StoreError, types::decimal_from_json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Last successful post for one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub last_price: Decimal,
    /// Only known for posts made by this process
    pub last_post_time: Option<DateTime<Utc>>,
}

/// In-memory post state, authoritative between saves
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostState {
    records: BTreeMap<String, PostRecord>,
}

impl PostState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&PostRecord> {
        self.records.get(symbol)
    }

    pub fn last_price(&self, symbol: &str) -> Option<Decimal> {
        self.records.get(symbol).map(|r| r.last_price)
    }

    pub fn last_post_time(&self, symbol: &str) -> Option<DateTime<Utc>> {
        self.records.get(symbol).and_then(|r| r.last_post_time)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records a confirmed post. The post time never moves backwards.
    pub fn record_post(&mut self, symbol: &str, price: Decimal, at: DateTime<Utc>) {
        let record = self
            .records
            .entry(symbol.to_string())
            .or_insert(PostRecord {
                last_price: price,
                last_post_time: None,
            });
        record.last_price = price;
        record.last_post_time = Some(match record.last_post_time {
            Some(prev) if prev > at => prev,
            _ => at,
        });
    }

    /// Sets a price without a post time, as read back from disk
    fn insert_price(&mut self, symbol: String, price: Decimal) {
        self.records.insert(
            symbol,
            PostRecord {
                last_price: price,
                last_post_time: None,
            },
        );
    }
}

/// JSON file store: `{"BTC": 50000, "ETH": 3012.55}`
pub struct PriceStore {
    path: PathBuf,
}

impl PriceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the last posted prices
    ///
    /// A missing or unreadable file yields an empty state; this never fails.
    pub fn load(&self) -> PostState {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No state file yet, starting empty");
                return PostState::new();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read state file, starting empty");
                return PostState::new();
            }
        };

        let raw: HashMap<String, serde_json::Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Corrupt state file, starting empty");
                return PostState::new();
            }
        };

        let mut state = PostState::new();
        for (symbol, value) in raw {
            match decimal_from_json(&value) {
                Some(price) => state.insert_price(symbol, price),
                None => {
                    tracing::warn!(symbol = %symbol, value = %value, "Ignoring non-numeric state entry")
                }
            }
        }

        tracing::info!(path = %self.path.display(), symbols = state.len(), "Loaded post state");
        state
    }

    /// Rewrites the whole state file
    ///
    /// Writes a sibling temp file first and renames it over the target so a
    /// crash mid-write leaves the previous file intact.
    pub fn save(&self, state: &PostState) -> Result<(), StoreError> {
        let mut out = serde_json::Map::new();
        for (symbol, record) in &state.records {
            let number: serde_json::Value =
                serde_json::from_str(&record.last_price.normalize().to_string())?;
            out.insert(symbol.clone(), number);
        }
        let body = serde_json::to_string_pretty(&serde_json::Value::Object(out))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), symbols = state.len(), "Saved post state");
        Ok(())
    }
}

//! Recently generated payloads, with favorites.
//!
//! History is a newest-first list capped at a fixed length. Adding a payload that is already
//! present moves it to the front instead of duplicating it. Every mutation is written through
//! to a [`HistoryStore`].
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{Classification, DataKind};
use crate::error::{Error, Result};

/// Maximum number of entries kept by default.
pub const DEFAULT_LIMIT: usize = 20;

/// Number of entries returned by [`History::recent`].
pub const RECENT_LIMIT: usize = 10;

pub const HISTORY_FILE_NAME: &str = "qr-generator-history.json";

/// One remembered payload.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DataKind,
    pub original: String,
    pub formatted: String,
    pub description: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub is_favorite: bool,
}

impl HistoryItem {
    /// Copies a classification into a new, non-favorite entry.
    pub fn from_classification(classification: &Classification, timestamp: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            kind: classification.kind,
            original: classification.original.clone(),
            formatted: classification.formatted.clone(),
            description: classification.description.clone(),
            timestamp,
            is_favorite: false,
        }
    }
}

/// Persistent key-value storage for the history list.
pub trait HistoryStore {
    /// Loads every stored entry. A store that has never been written returns an empty list.
    fn load(&self) -> Result<Vec<HistoryItem>>;

    fn save(&mut self, items: &[HistoryItem]) -> Result<()>;
}

/// Stores history as a JSON array in a single file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> Result<Vec<HistoryItem>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.path, e)),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&mut self, items: &[HistoryItem]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
            }
        }
        let json = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, json).map_err(|e| Error::io(&self.path, e))
    }
}

/// Keeps history in memory only.
#[derive(Clone, Default, Debug)]
pub struct MemoryStore {
    pub items: Vec<HistoryItem>,
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<Vec<HistoryItem>> {
        Ok(self.items.clone())
    }

    fn save(&mut self, items: &[HistoryItem]) -> Result<()> {
        self.items = items.to_vec();
        Ok(())
    }
}

/// The history list bound to its store.
pub struct History<S: HistoryStore> {
    store: S,
    items: Vec<HistoryItem>,
    limit: usize,
}

impl<S: HistoryStore> History<S> {
    /// Loads history from `store`, keeping at most `limit` entries.
    ///
    /// Unparsable stored data is logged and discarded so a corrupt file never blocks the tool;
    /// I/O failures are returned.
    pub fn open(store: S, limit: usize) -> Result<Self> {
        let mut items = match store.load() {
            Ok(items) => items,
            Err(Error::Storage(e)) => {
                tracing::error!(error = %e, "failed to load history, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        items.truncate(limit);
        tracing::debug!(entries = items.len(), limit, "history loaded");
        Ok(Self {
            store,
            items,
            limit,
        })
    }

    /// Records a classification as the newest entry and returns its id.
    pub fn add(&mut self, classification: &Classification) -> Result<String> {
        self.add_at(classification, Utc::now().timestamp_millis())
    }

    /// Like [`add`](Self::add) with an explicit timestamp.
    pub fn add_at(&mut self, classification: &Classification, timestamp: i64) -> Result<String> {
        let item = HistoryItem::from_classification(classification, timestamp);
        let id = item.id.clone();
        self.items.retain(|h| h.formatted != item.formatted);
        self.items.insert(0, item);
        self.items.truncate(self.limit);
        self.persist()?;
        Ok(id)
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        let before = self.items.len();
        self.items.retain(|h| h.id != id);
        if self.items.len() == before {
            return Err(Error::NotFound(id.to_string()));
        }
        self.persist()
    }

    /// Flips the favorite flag and returns the new value.
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool> {
        let item = self
            .items
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        item.is_favorite = !item.is_favorite;
        let now = item.is_favorite;
        self.persist()?;
        Ok(now)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.persist()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|h| h.id == id)
    }

    /// Every entry, newest first.
    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn favorites(&self) -> Vec<&HistoryItem> {
        self.items.iter().filter(|h| h.is_favorite).collect()
    }

    pub fn recent(&self) -> &[HistoryItem] {
        &self.items[..self.items.len().min(RECENT_LIMIT)]
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(&self.items)
    }
}

/// Describes how long ago `timestamp` was relative to `now` (both epoch milliseconds).
pub fn format_age(timestamp: i64, now: i64) -> String {
    let diff = now.saturating_sub(timestamp).max(0);
    let mins = diff / 60_000;
    let hours = diff / 3_600_000;
    let days = diff / 86_400_000;
    if mins < 1 {
        "just now".to_string()
    } else if mins < 60 {
        format!("{mins} min ago")
    } else if hours < 24 {
        format!("{hours} h ago")
    } else if days < 7 {
        format!("{days} d ago")
    } else {
        match Utc.timestamp_millis_opt(timestamp).single() {
            Some(utc) => {
                let local: DateTime<Local> = utc.with_timezone(&Local);
                local.format("%Y-%m-%d").to_string()
            }
            None => "unknown".to_string(),
        }
    }
}

//! Record storage abstraction
//!
//! The bot treats its backing store as an append-only table of
//! [`LocationNote`]s: read everything, or append one row. There is no
//! caching, no update, no delete, and concurrent writers are last-write-wins.
//!
//! # Example
//!
//! ```rust,ignore
//! use placenote::store::{RecordStore, StoreProvider};
//!
//! // Process-local store (development and tests)
//! let store = StoreProvider::Memory.create_store().await?;
//!
//! // Google spreadsheet
//! let store = StoreProvider::Sheets(config.sheets.clone()).create_store().await?;
//!
//! store.append(&note).await?;
//! let all = store.fetch_all().await?;
//! ```

use crate::sheets::SheetsRecordStore;
use crate::types::{LocationNote, Result};
use crate::utils::toml_config::SheetsConfig;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

/// Which backend holds the notes
#[derive(Debug, Clone, Default)]
pub enum StoreProvider {
    /// Process-local store, lost on restart
    #[default]
    Memory,
    /// Google spreadsheet authenticated by a service account key
    Sheets(SheetsConfig),
}

impl StoreProvider {
    /// Create a record store from this provider configuration
    pub async fn create_store(&self) -> Result<Arc<dyn RecordStore>> {
        match self {
            StoreProvider::Memory => Ok(Arc::new(InMemoryRecordStore::new())),
            StoreProvider::Sheets(config) => {
                let store = SheetsRecordStore::from_config(config).await?;
                Ok(Arc::new(store))
            }
        }
    }
}

/// Append-only table of notes
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every stored note, in storage order (header row excluded)
    async fn fetch_all(&self) -> Result<Vec<LocationNote>>;

    /// Append one note as a new row
    async fn append(&self, note: &LocationNote) -> Result<()>;
}

/// Store backed by a `Vec`, used for local runs and tests
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    notes: RwLock<Vec<LocationNote>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notes(notes: Vec<LocationNote>) -> Self {
        Self {
            notes: RwLock::new(notes),
        }
    }

    pub fn len(&self) -> usize {
        self.notes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<LocationNote> {
        self.notes.read().clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_all(&self) -> Result<Vec<LocationNote>> {
        Ok(self.snapshot())
    }

    async fn append(&self, note: &LocationNote) -> Result<()> {
        self.notes.write().push(note.clone());
        Ok(())
    }
}

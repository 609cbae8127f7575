//! Mock implementations for testing.
//!
//! Shared between the integration test files so each one can build a
//! dispatcher without a real Telegram bot or spreadsheet.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use placenote::store::{InMemoryRecordStore, RecordStore};
use placenote::telegram::{ChatId, Messenger, ParseMode};
use placenote::types::{AppError, LocationNote, Result};
use placenote::{InMemorySessionStore, SessionStore, UpdateDispatcher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A message the bot tried to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

/// Messenger that records every outgoing message instead of sending it.
///
/// # Examples
///
/// ```ignore
/// let messenger = RecordingMessenger::new();
/// dispatcher.handle_text(ChatId(1), "/add").await?;
/// assert!(messenger.last_text().unwrap().contains("Name"));
/// ```
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    fail_sends: AtomicBool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|m| m.text.clone()).collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.sent.lock().last().map(|m| m.text.clone())
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    /// Make every later send fail without recording the message
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(AppError::Telegram("Mock send failure".to_string()));
        }
        self.sent.lock().push(SentMessage {
            chat_id,
            text: text.to_string(),
            parse_mode,
        });
        Ok(())
    }
}

/// Record store whose reads and writes can be made to fail on demand.
///
/// Successful calls go to an inner [`InMemoryRecordStore`].
#[derive(Default)]
pub struct FlakyRecordStore {
    inner: InMemoryRecordStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notes(notes: Vec<LocationNote>) -> Self {
        Self {
            inner: InMemoryRecordStore::with_notes(notes),
            ..Default::default()
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<LocationNote> {
        self.inner.snapshot()
    }
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn fetch_all(&self) -> Result<Vec<LocationNote>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Storage("Mock read failure".to_string()));
        }
        self.inner.fetch_all().await
    }

    async fn append(&self, note: &LocationNote) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("Mock write failure".to_string()));
        }
        self.inner.append(note).await
    }
}

/// Everything a dispatcher test needs to drive and inspect the bot
pub struct TestBot {
    pub dispatcher: UpdateDispatcher,
    pub sessions: Arc<InMemorySessionStore>,
    pub records: Arc<FlakyRecordStore>,
    pub messenger: Arc<RecordingMessenger>,
}

impl TestBot {
    pub fn new() -> Self {
        Self::with_notes(Vec::new())
    }

    pub fn with_notes(notes: Vec<LocationNote>) -> Self {
        let sessions = Arc::new(InMemorySessionStore::with_defaults());
        let records = Arc::new(FlakyRecordStore::with_notes(notes));
        let messenger = Arc::new(RecordingMessenger::new());

        let dispatcher = UpdateDispatcher::new(
            sessions.clone() as Arc<dyn SessionStore>,
            records.clone() as Arc<dyn RecordStore>,
            messenger.clone() as Arc<dyn Messenger>,
        );

        Self {
            dispatcher,
            sessions,
            records,
            messenger,
        }
    }
}

pub fn note(name: &str, kind: &str, category: &str, address: &str, city: &str, text: &str) -> LocationNote {
    LocationNote {
        name: name.to_string(),
        kind: kind.to_string(),
        category: category.to_string(),
        address: address.to_string(),
        city: city.to_string(),
        note: text.to_string(),
    }
}

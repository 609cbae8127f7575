use crate::bot::command::{parse_import, Command, IMPORT_USAGE};
use crate::dialog::{DialogStep, Transition, UserSession};
use crate::search::{escape_html, search, SearchQuery};
use crate::session::SessionStore;
use crate::store::RecordStore;
use crate::telegram::{ChatId, Messenger, ParseMode, Update};
use crate::types::{AppError, LocationNote, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const HELP_TEXT: &str = "👋 <b>Place notes</b>\n\n\
    /add - save a new place, step by step\n\
    /import name | type | category | address | city | note - save in one line\n\
    /cancel - stop the current /add\n\n\
    Send any word to search by name or type, then category, then location.\n\
    Filter one field with /name, /type, /category, /address, /city or /note, \
    e.g. <code>/city hanoi</code>.";

pub const CANCELLED_TEXT: &str = "❌ Cancelled.";
pub const SAVING_TEXT: &str = "⏳ Saving...";
pub const SAVE_FAILED_TEXT: &str =
    "⚠️ Could not save right now. Send the last answer again to retry, or /cancel.";
pub const STORAGE_UNAVAILABLE_TEXT: &str = "⚠️ Storage is unavailable, please try again later.";

/// Routes each incoming message to the dialog, a command or a search
pub struct UpdateDispatcher {
    sessions: Arc<dyn SessionStore>,
    records: Arc<dyn RecordStore>,
    messenger: Arc<dyn Messenger>,
    session_ttl: Option<Duration>,
}

impl UpdateDispatcher {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        records: Arc<dyn RecordStore>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            sessions,
            records,
            messenger,
            session_ttl: None,
        }
    }

    /// Override the session store's default TTL for dialog sessions
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// Handle one webhook update. Updates without message text are ignored.
    pub async fn handle_update(&self, update: &Update) -> Result<()> {
        let Some(message) = update.message() else {
            debug!(update_id = update.update_id, "Ignoring update without a message");
            return Ok(());
        };
        let Some(text) = message.text() else {
            debug!(update_id = update.update_id, "Ignoring message without text");
            return Ok(());
        };

        self.handle_text(message.chat.id, text).await
    }

    /// Handle one text message from a chat
    pub async fn handle_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let command = Command::parse(text);

        if command == Command::Cancel {
            if self.sessions.remove(chat_id).is_some() {
                info!(chat_id = %chat_id, "Dialog cancelled");
            }
            return self.reply(chat_id, CANCELLED_TEXT).await;
        }

        // An active dialog consumes every message, commands included
        if let Some(session) = self.sessions.get(chat_id) {
            if session.step.is_active() {
                return self.continue_dialog(chat_id, session, text).await;
            }
        }

        match command {
            Command::Add => {
                self.sessions
                    .set(chat_id, UserSession::start(), self.session_ttl);
                debug!(chat_id = %chat_id, "Dialog started");
                self.reply(chat_id, DialogStep::WaitingName.prompt()).await
            }
            Command::Import(args) => match parse_import(&args) {
                Ok(note) => {
                    self.persist(chat_id, &note).await?;
                    self.confirm_saved(chat_id, &note).await
                }
                Err(AppError::InvalidInput(reason)) => {
                    let text = format!(
                        "⚠️ Bad syntax: {}.\nUsage: <code>{}</code>",
                        escape_html(&reason),
                        IMPORT_USAGE
                    );
                    self.reply(chat_id, &text).await
                }
                Err(e) => Err(e),
            },
            Command::Help => self.reply(chat_id, HELP_TEXT).await,
            Command::Text(text) => self.search(chat_id, &text).await,
            Command::Cancel => Ok(()),
        }
    }

    async fn continue_dialog(
        &self,
        chat_id: ChatId,
        mut session: UserSession,
        text: &str,
    ) -> Result<()> {
        match session.advance(text) {
            Transition::Continue { prompt } => {
                self.sessions.set(chat_id, session, self.session_ttl);
                self.reply(chat_id, prompt).await
            }
            Transition::Complete(note) => {
                // Kept at WaitingNote until the append succeeds
                self.sessions.set(chat_id, session, self.session_ttl);
                if let Err(e) = self.reply(chat_id, SAVING_TEXT).await {
                    warn!(chat_id = %chat_id, error = %e, "Failed to send saving notice");
                }
                self.persist(chat_id, &note).await?;
                self.sessions.remove(chat_id);
                self.confirm_saved(chat_id, &note).await
            }
            Transition::Idle => self.search(chat_id, text).await,
        }
    }

    /// Append the note; on failure tell the user and return the error
    async fn persist(&self, chat_id: ChatId, note: &LocationNote) -> Result<()> {
        if let Err(e) = self.records.append(note).await {
            warn!(chat_id = %chat_id, error = %e, "Failed to save note");
            self.notify_failure(chat_id, SAVE_FAILED_TEXT).await;
            return Err(e);
        }

        info!(chat_id = %chat_id, name = %note.name, "Note saved");
        Ok(())
    }

    async fn confirm_saved(&self, chat_id: ChatId, note: &LocationNote) -> Result<()> {
        let text = format!("✅ Saved <b>{}</b>!", escape_html(&note.name));
        self.reply(chat_id, &text).await
    }

    async fn search(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let query = match SearchQuery::parse(text) {
            Ok(query) => query,
            Err(AppError::InvalidInput(reason)) => {
                let text = format!("⚠️ Bad syntax: {}.", escape_html(&reason));
                return self.reply(chat_id, &text).await;
            }
            Err(e) => return Err(e),
        };

        let notes = match self.records.fetch_all().await {
            Ok(notes) => notes,
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "Failed to read notes");
                self.notify_failure(chat_id, STORAGE_UNAVAILABLE_TEXT).await;
                return Err(e);
            }
        };

        let outcome = search(&query, &notes);
        debug!(
            chat_id = %chat_id,
            field = ?query.field,
            found = outcome.is_found(),
            "Search finished"
        );
        self.reply(chat_id, &outcome.render()).await
    }

    /// Tell the user about a storage failure; the storage error is what the caller returns
    async fn notify_failure(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.reply(chat_id, text).await {
            warn!(chat_id = %chat_id, error = %e, "Failed to send failure notice");
        }
    }

    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.messenger
            .send_message(chat_id, text, Some(ParseMode::Html))
            .await
    }
}

//! # placenote
//!
//! A Telegram bot that saves "place notes" (somewhere worth remembering:
//! a restaurant, a cafe, a camping spot) into a Google spreadsheet and
//! searches them again by keyword.
//!
//! ## Overview
//!
//! Telegram delivers updates to `POST /api/webhook`. The
//! [`UpdateDispatcher`] then does one of three things with each message:
//!
//! 1. Continues an `/add` dialog that collects the six fields of a note one
//!    message at a time (name, type, category, address, city, note).
//! 2. Runs a command: `/cancel`, `/import`, `/help`.
//! 3. Searches the saved notes with case-insensitive substring matching.
//!
//! Dialog progress lives in a [`SessionStore`] keyed by chat and expires
//! after a configurable idle time. Notes are stored in a [`RecordStore`],
//! usually a Google spreadsheet authenticated with a service account.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use placenote::{create_app, AppState, BotConfig, InMemorySessionStore, UpdateDispatcher};
//! use placenote::store::StoreProvider;
//! use placenote::telegram::TelegramClient;
//! use std::sync::Arc;
//!
//! let config = BotConfig::load("placenote.toml")?;
//! let sessions = Arc::new(InMemorySessionStore::new(config.session.clone()));
//! let records = StoreProvider::Sheets(config.sheets.clone()).create_store().await?;
//! let telegram = Arc::new(TelegramClient::new(config.bot_token()?, &config.telegram.api_base));
//!
//! let dispatcher = UpdateDispatcher::new(sessions.clone(), records, telegram);
//! let state = AppState::new(&config, dispatcher, sessions)?;
//! let app = create_app(state);
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Webhook and health endpoints
//! - [`bot`] - Command parsing and update dispatch
//! - [`dialog`] - The step-by-step `/add` state machine
//! - [`search`] - Cascading keyword search and reply formatting
//! - [`session`] - Per-chat dialog state with TTL
//! - [`sheets`] - Google Sheets storage and service account auth
//! - [`store`] - Record storage abstraction
//! - [`telegram`] - Bot API types and client
//! - [`types`] - The note model and error type

#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command parsing and update dispatch.
pub mod bot;
/// Command-line interface.
pub mod cli;
/// The `/add` dialog state machine.
pub mod dialog;
/// Keyword search over saved notes.
pub mod search;
/// Per-chat dialog sessions.
pub mod session;
/// Google Sheets storage backend.
pub mod sheets;
/// Record storage abstraction.
pub mod store;
/// Telegram Bot API types and client.
pub mod telegram;
/// Core types (note model, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use bot::UpdateDispatcher;
pub use session::{InMemorySessionStore, SessionStore};
pub use store::{InMemoryRecordStore, RecordStore};
pub use types::{AppError, LocationNote, Result};
pub use utils::toml_config::BotConfig;

use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Largest webhook body accepted
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Routes updates to dialog, commands and search
    pub dispatcher: Arc<UpdateDispatcher>,
    /// Dialog sessions, shared with the dispatcher
    pub sessions: Arc<dyn SessionStore>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`, if configured
    pub webhook_secret: Option<String>,
}

impl AppState {
    /// Build state, resolving the webhook secret from the environment
    pub fn new(
        config: &BotConfig,
        dispatcher: UpdateDispatcher,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let webhook_secret = config
            .webhook_secret()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            sessions,
            webhook_secret,
        })
    }
}

/// The full HTTP application: routes, request tracing and body limit
pub fn create_app(state: AppState) -> Router {
    api::routes::create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

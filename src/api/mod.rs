//! HTTP surface of the bot, built on Axum.
//!
//! # Endpoints
//!
//! - `POST /api/webhook` - Telegram update delivery. When a webhook secret is
//!   configured, the `X-Telegram-Bot-Api-Secret-Token` header must match or the
//!   call is rejected with 401. Every other request is acknowledged with 200.
//! - `GET /health` - `{"status": "ok", "active_sessions": N}`

/// Request handlers.
pub mod handlers;
/// Router configuration.
pub mod routes;

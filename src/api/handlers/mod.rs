//! API request handlers.

/// Liveness probe.
pub mod health;
/// Telegram webhook receiver.
pub mod webhook;

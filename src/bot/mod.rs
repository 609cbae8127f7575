//! Conversation handling
//!
//! [`UpdateDispatcher`] is the single entry point for incoming messages. It
//! decides, per chat, whether a message continues an `/add` dialog, is a
//! command, or is a search.

pub mod command;
pub mod dispatcher;

pub use command::{parse_import, Command};
pub use dispatcher::UpdateDispatcher;

//! Configuration utilities.

/// TOML configuration (`placenote.toml`) and its validation.
pub mod toml_config;

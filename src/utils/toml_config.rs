//! TOML-based configuration for the place-note bot
//!
//! Infrastructure settings (server, Telegram, spreadsheet, sessions) are read
//! from a TOML file (`placenote.toml` by default). Secrets never live in the
//! file itself: the file names the environment variables that hold them,
//! and `.env` is loaded with `dotenvy` before resolution.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from placenote.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub sheets: SheetsConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

// ============= Telegram Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Environment variable name containing the bot token
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// Environment variable name containing the webhook secret token (optional)
    pub webhook_secret_env: Option<String>,
}

fn default_bot_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_string()
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: default_bot_token_env(),
            api_base: default_telegram_api_base(),
            webhook_secret_env: None,
        }
    }
}

// ============= Spreadsheet Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Spreadsheet id, as found in the sheet URL (`/d/<id>/edit`)
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Tab holding the notes; row 1 is a header
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Path to the service account JSON key
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("service_account.json")
}

fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: default_sheet_name(),
            credentials_path: default_credentials_path(),
            api_base: default_sheets_api_base(),
        }
    }
}

// ============= Session Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle lifetime of an in-progress entry, refreshed on every step
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_session_ttl_secs() -> u64 {
    1800
}

fn default_max_sessions() -> usize {
    10_000
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl BotConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration without checking env vars or required fields.
    ///
    /// Used by commands that only inspect the file.
    pub fn load_unvalidated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate the configuration for the spreadsheet-backed server
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_common()?;

        if self.sheets.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "sheets.spreadsheet_id must be set".to_string(),
            ));
        }

        Ok(())
    }

    /// Validation that applies regardless of the record store backend
    pub fn validate_common(&self) -> Result<(), ConfigError> {
        self.validate_env_var(&self.telegram.bot_token_env)?;

        if let Some(ref env) = self.telegram.webhook_secret_env {
            self.validate_env_var(env)?;
        }

        if self.session.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "session.ttl_secs must be greater than zero".to_string(),
            ));
        }

        if self.session.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_sessions must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingEnvVar(name.to_string())),
        }
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }

    /// Get the bot token from the environment
    pub fn bot_token(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.telegram.bot_token_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.telegram.bot_token_env.clone()))
    }

    /// Get the webhook secret, if one is configured
    pub fn webhook_secret(&self) -> Result<Option<String>, ConfigError> {
        match self.telegram.webhook_secret_env {
            Some(ref env) => self
                .resolve_env(env)
                .map(Some)
                .ok_or_else(|| ConfigError::MissingEnvVar(env.clone())),
            None => Ok(None),
        }
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_config() -> String {
        r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"
log_format = "json"

[telegram]
bot_token_env = "PLACENOTE_TEST_TOKEN"

[sheets]
spreadsheet_id = "sheet-123"
sheet_name = "Places"
credentials_path = "keys/sa.json"

[session]
ttl_secs = 60
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config: BotConfig = toml::from_str(&create_test_config()).expect("Failed to parse config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.telegram.bot_token_env, "PLACENOTE_TEST_TOKEN");
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.sheets.sheet_name, "Places");
        assert_eq!(config.sheets.credentials_path, PathBuf::from("keys/sa.json"));
        assert_eq!(config.session.ttl(), Duration::from_secs(60));
        assert_eq!(config.session.max_sessions, 10_000);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: BotConfig = toml::from_str("").unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.log_format, LogFormat::Pretty);
        assert_eq!(config.telegram.bot_token_env, "TELEGRAM_BOT_TOKEN");
        assert_eq!(config.sheets.sheet_name, "Sheet1");
        assert_eq!(config.session.ttl_secs, 1800);
    }

    #[test]
    fn test_validation_missing_token() {
        let content = r#"
[telegram]
bot_token_env = "PLACENOTE_TEST_TOKEN_NEVER_SET"
[sheets]
spreadsheet_id = "abc"
"#;
        let config: BotConfig = toml::from_str(content).unwrap();

        assert!(matches!(config.validate(), Err(ConfigError::MissingEnvVar(_))));
        assert!(matches!(config.bot_token(), Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_validation_missing_spreadsheet_id() {
        // SAFETY: Tests are run single-threaded for env var safety
        unsafe {
            std::env::set_var("PLACENOTE_TEST_TOKEN_SHEET", "123:abc");
        }

        let content = r#"
[telegram]
bot_token_env = "PLACENOTE_TEST_TOKEN_SHEET"
"#;
        let config: BotConfig = toml::from_str(content).unwrap();

        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
        assert!(config.validate_common().is_ok());
        assert_eq!(config.bot_token().unwrap(), "123:abc");
    }

    #[test]
    fn test_validation_zero_ttl() {
        // SAFETY: Tests are run single-threaded for env var safety
        unsafe {
            std::env::set_var("PLACENOTE_TEST_TOKEN_TTL", "123:abc");
        }

        let content = r#"
[telegram]
bot_token_env = "PLACENOTE_TEST_TOKEN_TTL"
[session]
ttl_secs = 0
"#;
        let config: BotConfig = toml::from_str(content).unwrap();

        assert!(matches!(
            config.validate_common(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_webhook_secret_resolution() {
        let mut config = BotConfig::default();
        assert!(config.webhook_secret().unwrap().is_none());

        config.telegram.webhook_secret_env = Some("PLACENOTE_TEST_SECRET_UNSET".to_string());
        assert!(config.webhook_secret().is_err());

        // SAFETY: Tests are run single-threaded for env var safety
        unsafe {
            std::env::set_var("PLACENOTE_TEST_SECRET_SET", "s3cret");
        }
        config.telegram.webhook_secret_env = Some("PLACENOTE_TEST_SECRET_SET".to_string());
        assert_eq!(config.webhook_secret().unwrap().as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_load_file_not_found() {
        let result = BotConfig::load("/nonexistent/placenote.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        // SAFETY: Tests are run single-threaded for env var safety
        unsafe {
            std::env::set_var("PLACENOTE_TEST_TOKEN", "123:abc");
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(create_test_config().as_bytes()).unwrap();

        let config = BotConfig::load(file.path()).expect("config should load");
        assert_eq!(config.sheets.spreadsheet_id, "sheet-123");
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[server\nport = ").unwrap();

        let result = BotConfig::load_unvalidated(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}

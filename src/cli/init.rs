//! Init command implementation
//!
//! Scaffolds `placenote.toml`, `.env.example` and `.gitignore` in a directory.

use super::output::{Console, FileStatus};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the generated configuration file
pub const CONFIG_FILE: &str = "placenote.toml";

/// Result of the init operation
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// placenote.toml already exists
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
    /// Spreadsheet to store notes in, if already known
    pub spreadsheet_id: Option<String>,
}

/// Run the init command
pub fn run(config: InitConfig, console: &Console) -> InitResult {
    console.banner();
    console.section("Initializing placenote-bot");

    let base_path = &config.path;
    if !base_path.exists() {
        if let Err(e) = fs::create_dir_all(base_path) {
            console.fail(&format!("Failed to create {}: {}", base_path.display(), e));
            return InitResult::Error(e.to_string());
        }
    }

    let config_path = base_path.join(CONFIG_FILE);
    if config_path.exists() && !config.force {
        console.warn(&format!("{} already exists, pass --force to overwrite it", CONFIG_FILE));
        return InitResult::AlreadyExists;
    }

    if let Err(e) = write_file(&config_path, &generate_config_toml(&config), config.force) {
        console.fail(&format!("Failed to create {}: {}", CONFIG_FILE, e));
        return InitResult::Error(e.to_string());
    }
    console.file(CONFIG_FILE, FileStatus::Created);

    let env_example_path = base_path.join(".env.example");
    if env_example_path.exists() && !config.force {
        console.file(".env.example", FileStatus::Kept("already exists"));
    } else if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        console.fail(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    } else {
        console.file(".env.example", FileStatus::Created);
    }

    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        match write_file(&gitignore_path, &generate_gitignore(), false) {
            Ok(()) => console.file(".gitignore", FileStatus::Created),
            Err(e) => console.warn(&format!("Failed to create .gitignore: {}", e)),
        }
    }

    console.ok("placenote-bot initialized");

    console.section("Next steps");
    console.step(
        1,
        "Set the bot token:",
        &["cp .env.example .env", "# edit .env and set TELEGRAM_BOT_TOKEN"],
    );
    let sheet_steps: &[&str] = if config.spreadsheet_id.is_some() {
        &["# save the key as service_account.json next to placenote.toml"]
    } else {
        &[
            "# save the key as service_account.json next to placenote.toml",
            "# then set [sheets].spreadsheet_id in placenote.toml",
        ]
    };
    console.step(
        2,
        "Share the spreadsheet with your service account:",
        sheet_steps,
    );
    console.step(
        3,
        "Start the server and register the webhook:",
        &[
            "placenote-bot serve",
            "placenote-bot webhook set https://your-host/api/webhook",
        ],
    );

    println!();
    console.tip(&format!("the server listens on http://{}:{}", config.host, config.port));
    console.tip("try it without Google credentials: placenote-bot serve --memory-store");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_config_toml(config: &InitConfig) -> String {
    format!(
        r#"# placenote-bot configuration
# Secrets are never stored here; *_env keys name environment variables.

[server]
host = "{host}"
port = {port}
log_level = "info"
# "pretty" for terminals, "json" for log collectors
log_format = "pretty"

[telegram]
bot_token_env = "TELEGRAM_BOT_TOKEN"
api_base = "https://api.telegram.org"
# Uncomment to require X-Telegram-Bot-Api-Secret-Token on webhook calls
# webhook_secret_env = "TELEGRAM_WEBHOOK_SECRET"

[sheets]
spreadsheet_id = "{spreadsheet_id}"
sheet_name = "Sheet1"
credentials_path = "service_account.json"
api_base = "https://sheets.googleapis.com"

[session]
# An unfinished /add is forgotten after this many idle seconds
ttl_secs = 1800
max_sessions = 10000
"#,
        host = config.host,
        port = config.port,
        spreadsheet_id = config.spreadsheet_id.as_deref().unwrap_or(""),
    )
}

fn generate_env_example() -> String {
    r#"# placenote-bot Environment Variables
# Copy this file to .env and fill in the values.

# REQUIRED: bot token from @BotFather
TELEGRAM_BOT_TOKEN=123456:replace-me

# Optional: shared secret Telegram sends with every webhook call
# TELEGRAM_WEBHOOK_SECRET=change-me

# Optional: log filter, overrides [server].log_level
RUST_LOG=info,placenote=debug
"#
    .to_string()
}

fn generate_gitignore() -> String {
    r#"# Secrets
.env
.env.local
service_account.json

# Rust
/target/

# IDE
.idea/
.vscode/
*.swp

# OS
.DS_Store
Thumbs.db
"#
    .to_string()
}

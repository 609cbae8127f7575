//! CLI module for placenote-bot
//!
//! Command-line parsing for the `placenote-bot` binary, using clap for
//! arguments and owo-colors for terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// placenote-bot - Telegram place notes kept in a Google spreadsheet
#[derive(Parser, Debug)]
#[command(
    name = "placenote-bot",
    version,
    about = "Telegram bot that saves and searches place notes in a Google spreadsheet",
    long_about = "Receives Telegram updates on a webhook, walks users through adding a place\n\
                  step by step, and searches saved places by name, type, category or location.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a config.",
    after_help = "EXAMPLES:\n    \
                  placenote-bot init                     # Scaffold placenote.toml and .env.example\n    \
                  placenote-bot                          # Start the server (requires placenote.toml)\n    \
                  placenote-bot serve --memory-store     # Start without Google credentials\n    \
                  placenote-bot webhook set https://example.com/api/webhook"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "placenote.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the webhook server (default)
    Serve {
        /// Keep notes in process memory instead of the spreadsheet
        #[arg(long)]
        memory_store: bool,
    },

    /// Create placenote.toml, .env.example and .gitignore
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Spreadsheet ID to store notes in
        #[arg(long)]
        spreadsheet_id: Option<String>,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file and environment
        #[arg(long)]
        validate: bool,
    },

    /// Manage the Telegram webhook registration
    #[command(subcommand)]
    Webhook(WebhookCommands),
}

/// Webhook management subcommands
#[derive(Subcommand, Debug)]
pub enum WebhookCommands {
    /// Point Telegram at this server
    Set {
        /// Public HTTPS URL of the webhook endpoint, e.g. https://host/api/webhook
        url: String,
    },

    /// Stop Telegram from delivering updates to the webhook
    Delete,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

use anyhow::Context;
use placenote::cli::init::{self, InitConfig, InitResult};
use placenote::cli::output::Console;
use placenote::cli::{Cli, Commands, WebhookCommands};
use placenote::store::StoreProvider;
use placenote::telegram::TelegramClient;
use placenote::utils::toml_config::{BotConfig, LogFormat, ServerConfig};
use placenote::{create_app, AppState, InMemorySessionStore, UpdateDispatcher};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let Cli {
        config,
        verbose,
        no_color,
        command,
    } = Cli::parse_args();
    let console = Console::new(!no_color);

    match command {
        Some(Commands::Init {
            path,
            force,
            host,
            port,
            spreadsheet_id,
        }) => {
            let result = init::run(
                InitConfig {
                    path,
                    force,
                    host,
                    port,
                    spreadsheet_id,
                },
                &console,
            );
            match result {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(_) => std::process::exit(1),
            }
        }
        Some(Commands::Config { validate }) => show_config(&config, validate, &console),
        Some(Commands::Webhook(webhook)) => manage_webhook(&config, webhook, &console).await,
        Some(Commands::Serve { memory_store }) => serve(&config, memory_store, verbose, &console).await,
        None => serve(&config, false, verbose, &console).await,
    }
}

fn init_tracing(server: &ServerConfig, verbose: bool) {
    let default_filter = if verbose {
        "debug"
    } else {
        server.log_level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match server.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// Load config or print a coloured error and exit
fn load_or_exit(path: &Path, console: &Console, memory_store: bool) -> BotConfig {
    let result = BotConfig::load_unvalidated(path).and_then(|config| {
        if memory_store {
            config.validate_common()?;
        } else {
            config.validate()?;
        }
        Ok(config)
    });

    match result {
        Ok(config) => config,
        Err(e) => {
            console.fail(&e.to_string());
            console.tip("run 'placenote-bot init' to create a configuration");
            std::process::exit(1);
        }
    }
}

async fn serve(
    config_path: &Path,
    memory_store: bool,
    verbose: bool,
    console: &Console,
) -> anyhow::Result<()> {
    let config = load_or_exit(config_path, console, memory_store);
    init_tracing(&config.server, verbose);

    let token = config.bot_token()?;
    let provider = if memory_store {
        tracing::warn!("Using in-memory record store; notes are lost on restart");
        StoreProvider::Memory
    } else {
        StoreProvider::Sheets(config.sheets.clone())
    };
    let records = provider
        .create_store()
        .await
        .context("failed to initialise record store")?;

    let sessions = Arc::new(InMemorySessionStore::new(config.session.clone()));
    let telegram = Arc::new(TelegramClient::new(token, config.telegram.api_base.clone()));
    let dispatcher = UpdateDispatcher::new(sessions.clone(), records, telegram)
        .with_session_ttl(config.session.ttl());

    let addr = config.bind_addr();
    let state = AppState::new(&config, dispatcher, sessions)?;
    if state.webhook_secret.is_none() {
        tracing::warn!("No webhook secret configured; any caller can post updates");
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "placenote-bot listening");

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

fn show_config(config_path: &Path, validate: bool, console: &Console) -> anyhow::Result<()> {
    let config = match BotConfig::load_unvalidated(config_path) {
        Ok(config) => config,
        Err(e) => {
            console.fail(&e.to_string());
            std::process::exit(1);
        }
    };

    let env_status = |name: &str| match config.resolve_env(name) {
        Some(_) => format!("{} (set)", name),
        None => format!("{} (missing)", name),
    };

    console.section(&format!("Configuration: {}", config_path.display()));
    console.field("server", &config.bind_addr());
    console.field("log_level", &config.server.log_level);
    console.field("log_format", &format!("{:?}", config.server.log_format).to_lowercase());
    console.field("bot token", &env_status(&config.telegram.bot_token_env));
    console.field("telegram api", &config.telegram.api_base);
    console.field(
        "webhook secret",
        &config
            .telegram
            .webhook_secret_env
            .as_deref()
            .map(env_status)
            .unwrap_or_else(|| "disabled".to_string()),
    );
    console.field("spreadsheet", &config.sheets.spreadsheet_id);
    console.field("sheet", &config.sheets.sheet_name);
    console.field("credentials", &config.sheets.credentials_path.display().to_string());
    console.field("session ttl", &format!("{}s", config.session.ttl_secs));
    console.field("max sessions", &config.session.max_sessions.to_string());

    if validate {
        println!();
        match config.validate() {
            Ok(()) => console.ok("Configuration is valid"),
            Err(e) => {
                console.fail(&e.to_string());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn manage_webhook(
    config_path: &Path,
    command: WebhookCommands,
    console: &Console,
) -> anyhow::Result<()> {
    let config = load_or_exit(config_path, console, true);
    let client = TelegramClient::new(config.bot_token()?, config.telegram.api_base.clone());

    let result = match command {
        WebhookCommands::Set { url } => {
            let secret = config.webhook_secret()?;
            client
                .set_webhook(&url, secret.as_deref())
                .await
                .map(|_| format!("Webhook set to {}", url))
        }
        WebhookCommands::Delete => client
            .delete_webhook()
            .await
            .map(|_| "Webhook deleted".to_string()),
    };

    match result {
        Ok(message) => {
            console.ok(&message);
            Ok(())
        }
        Err(e) => {
            console.fail(&e.to_string());
            std::process::exit(1);
        }
    }
}

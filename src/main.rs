//! ctrlbot - controller plugin runtime for a chat bot.
//!
//! Runs the terminal control surface by default; the subcommands manage
//! controllers, settings, and the bot token without opening it.

#![allow(clippy::single_match_else)]

use std::fs::OpenOptions;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ctrlbot::core::AppConfig;
use ctrlbot::plugin::{catalog, IncomingMessage};
use ctrlbot::security::{open_credential_store, SecretValue};
use ctrlbot::service::{ChatClient, LoopbackClient, ServiceManager, ServiceOptions, ServiceState};
use ctrlbot::settings::{SettingEdit, SettingsStore};
use ctrlbot::{tui, App, ControllerRegistry};

/// Account name reported by the in-process client.
const LOOPBACK_USER: &str = "ctrlbot (loopback)";

/// Controller plugin runtime for a chat bot
#[derive(Parser)]
#[command(name = "ctrlbot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default lookup
    #[arg(short, long, global = true, env = "CTRLBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the control surface (default)
    Run,

    /// Run the bot headless, reading chat messages from stdin
    Serve {
        /// Author name for messages read from stdin
        #[arg(long, default_value = "console")]
        author: String,

        /// Treat the console author as a server administrator
        #[arg(long)]
        admin: bool,
    },

    /// List discovered controllers
    Plugins {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show and edit controller settings
    Settings {
        #[command(subcommand)]
        operation: SettingsOperation,
    },

    /// Manage the bot token
    Token {
        #[command(subcommand)]
        operation: TokenOperation,
    },

    /// Write the default controller units and settings file
    Init {
        /// Overwrite existing unit files
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Settings operations.
#[derive(Subcommand)]
enum SettingsOperation {
    /// Print settings as JSON
    Show {
        /// Only this controller (or ControllerBot)
        plugin: Option<String>,
    },

    /// Set one key; the value is parsed according to the key's type
    Set { plugin: String, key: String, value: String },

    /// Restore a controller's defaults
    Reset { plugin: String },
}

/// Token operations.
#[derive(Subcommand)]
enum TokenOperation {
    /// Store a token
    Set { value: String },

    /// Show whether a token is stored
    Status,

    /// Remove the stored token
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load()?,
    };

    let interactive = matches!(cli.command, None | Some(Commands::Run));
    init_tracing(cli.verbose, interactive);

    match cli.command {
        None | Some(Commands::Run) => cmd_run(&config),
        Some(Commands::Serve { author, admin }) => cmd_serve(&config, author, admin),
        Some(Commands::Plugins { format }) => cmd_plugins(&config, &format),
        Some(Commands::Settings { operation }) => cmd_settings(&config, operation),
        Some(Commands::Token { operation }) => cmd_token(&config, operation),
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Config { path }) => cmd_config(&config, cli.config.as_deref(), path),
        Some(Commands::Completions { shell }) => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Setup logging.
///
/// The control surface owns the terminal, so it logs to a file in the data
/// directory; everything else logs to stderr.
fn init_tracing(verbose: bool, interactive: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    if interactive {
        let file = AppConfig::data_dir().and_then(|dir| {
            std::fs::create_dir_all(&dir).ok()?;
            OpenOptions::new().create(true).append(true).open(dir.join("ctrlbot.log")).ok()
        });
        let layer = file.map(|file| {
            fmt::layer().with_target(false).with_ansi(false).with_writer(std::sync::Mutex::new(file))
        });
        tracing_subscriber::registry().with(layer).with(filter).init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .with(filter)
            .init();
    }
}

/// Discover controllers and build a stopped service around `client`.
fn build_service(config: &AppConfig, client: Arc<dyn ChatClient>) -> ServiceManager {
    let store = SettingsStore::new(config.settings_path());
    let registry = ControllerRegistry::discover(config.controllers_path(), &store);
    ServiceManager::new(registry, store, client, ServiceOptions::from(&config.service))
}

/// Service for commands that never start the bot.
fn offline_service(config: &AppConfig) -> ServiceManager {
    let (client, _handle) = LoopbackClient::new(LOOPBACK_USER);
    build_service(config, Arc::new(client))
}

/// Open the control surface.
fn cmd_run(config: &AppConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    // Held for the whole session so the client's message source stays open.
    let (client, _handle) = LoopbackClient::new(LOOPBACK_USER);
    let service = Arc::new(build_service(config, Arc::new(client)));

    let app = App::new(service, runtime.handle().clone(), open_credential_store(config), &config.ui);
    tui::run_tui(app, config.ui.tick_rate())
}

/// Run headless: stdin lines are chat messages, replies go to stdout.
fn cmd_serve(config: &AppConfig, author: String, admin: bool) -> Result<()> {
    let credentials = open_credential_store(config);
    let token = credentials.get()?.filter(|t| !t.is_empty()).with_context(|| {
        format!("No token in {}. Run `ctrlbot token set <TOKEN>` first", credentials.describe())
    })?;

    let runtime = tokio::runtime::Runtime::new()?;
    let (client, mut handle) = LoopbackClient::new(LOOPBACK_USER);
    let service = build_service(config, Arc::new(client));

    runtime.block_on(async {
        let plugins = service.start(&token).await?;
        eprintln!("Logged in as {LOOPBACK_USER}. Active controllers: {}", plugins.join(", "));

        let (stop_tx, mut stop_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
        ctrlc::set_handler(move || {
            let _ = stop_tx.send(());
        })?;

        let (line_tx, mut line_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines().map_while(Result::ok) {
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = stop_rx.recv() => break,
                line = line_rx.recv() => {
                    let Some(line) = line else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let mut message = IncomingMessage::new(author.as_str(), line);
                    if admin {
                        message = message.as_admin();
                    }
                    if !handle.send(message) {
                        break;
                    }
                    if let Some(out) = handle.recv_reply(Duration::from_millis(250)).await {
                        for text in &out.reply.messages {
                            println!("{text}");
                        }
                        for action in &out.reply.actions {
                            println!("-> {action}");
                        }
                    }
                }
            }

            if service.reap().await.is_some() {
                break;
            }
            for event in service.poll_events() {
                eprintln!("{}", event.describe());
            }
        }

        if service.state() == ServiceState::Running {
            service.stop().await?;
        }
        eprintln!("Bot stopped");
        Ok::<_, anyhow::Error>(())
    })
}

/// List discovered controllers.
fn cmd_plugins(config: &AppConfig, format: &str) -> Result<()> {
    let store = SettingsStore::new(config.settings_path());
    let registry = ControllerRegistry::discover(config.controllers_path(), &store);

    match format {
        "json" => {
            let plugins: Vec<_> = registry
                .descriptors()
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "name": d.name(),
                        "unit": d.unit(),
                        "defaults": d.defaults(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&plugins)?);
        }
        _ => {
            for descriptor in registry.descriptors() {
                println!("{} ({})", descriptor.name(), descriptor.unit());
                for (key, value) in descriptor.defaults().iter() {
                    println!("    {key} = {value}");
                }
            }
            println!("\nTotal: {} controllers", registry.len());
        }
    }

    Ok(())
}

/// Show and edit settings.
fn cmd_settings(config: &AppConfig, operation: SettingsOperation) -> Result<()> {
    let service = offline_service(config);

    match operation {
        SettingsOperation::Show { plugin: None } => {
            println!("{}", serde_json::to_string_pretty(&service.pending_document())?);
        }
        SettingsOperation::Show { plugin: Some(plugin) } => {
            let settings =
                service.pending(&plugin).with_context(|| format!("Unknown plugin '{plugin}'"))?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsOperation::Set { plugin, key, value } => {
            let stored = service.apply_edit(&plugin, &key, &SettingEdit::Text(value))?;
            ensure_saved(&service)?;
            println!("{plugin}.{key} = {stored}");
        }
        SettingsOperation::Reset { plugin } => {
            service.reset_plugin(&plugin)?;
            ensure_saved(&service)?;
            println!("{plugin} reset to defaults");
        }
    }

    Ok(())
}

fn ensure_saved(service: &ServiceManager) -> Result<()> {
    if service.has_unsaved_changes() {
        anyhow::bail!("Change not saved to {}", service.store().path().display());
    }
    Ok(())
}

/// Manage the bot token.
fn cmd_token(config: &AppConfig, operation: TokenOperation) -> Result<()> {
    let store = open_credential_store(config);

    match operation {
        TokenOperation::Set { value } => {
            store.set(&SecretValue::new(value.trim()))?;
            println!("Token saved to {}", store.describe());
        }
        TokenOperation::Status => match store.get()? {
            Some(token) if !token.is_empty() => {
                println!("Token: {} ({})", token.masked(), store.describe());
            }
            _ => println!("No token configured ({})", store.describe()),
        },
        TokenOperation::Clear => {
            store.clear()?;
            println!("Token removed from {}", store.describe());
        }
    }

    Ok(())
}

/// Write the default units and settings file.
fn cmd_init(config: &AppConfig, force: bool) -> Result<()> {
    let dir = config.controllers_path();
    let written = catalog::write_default_units(&dir, force)?;
    if written.is_empty() {
        println!("Controller units already present in {}", dir.display());
    }
    for path in &written {
        println!("Wrote {}", path.display());
    }

    let store = SettingsStore::new(config.settings_path());
    let registry = ControllerRegistry::discover(&dir, &store);
    let document = store.load_document(&registry.defaults_document());
    if store.ensure_initialized(&document)? {
        println!("Wrote {}", store.path().display());
    }

    println!("{} controller(s) ready", registry.len());
    Ok(())
}

/// Show configuration.
fn cmd_config(config: &AppConfig, explicit: Option<&std::path::Path>, show_path: bool) -> Result<()> {
    if show_path {
        let path = explicit.map(PathBuf::from).or_else(AppConfig::locate).or_else(AppConfig::global_path);
        if let Some(path) = path {
            println!("{}", path.display());
        }
        return Ok(());
    }

    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "ctrlbot", &mut io::stdout());
}

mod cmd;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sequence_core::config::{Config, LoggingConfig, CONFIG_FILE};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sequences",
    about = "HTTP API for messaging sequences and their steps",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to the YAML config file (missing file = defaults)
    #[arg(long, global = true, env = "SEQUENCES_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file at --config
    Init,

    /// Start the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, env = "SEQUENCES_HOST")]
        host: Option<String>,

        /// Port to listen on (0 = OS-assigned)
        #[arg(long, env = "SEQUENCES_PORT")]
        port: Option<u16>,

        /// SQLite database file
        #[arg(long, env = "SEQUENCES_DB")]
        db: Option<PathBuf>,
    },

    /// Create the database if needed and apply the schema
    Migrate {
        /// SQLite database file
        #[arg(long, env = "SEQUENCES_DB")]
        db: Option<PathBuf>,
    },
}

fn init_logging(default_level: &str, logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .with_context(|| format!("invalid log level '{default_level}'"))?,
    };

    match &logging.file {
        // Release-style deployments log to a file without colours.
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;

    let default_level = match &cli.command {
        Commands::Serve { .. } => config.logging.level.clone(),
        Commands::Init | Commands::Migrate { .. } => "warn".to_string(),
    };
    init_logging(&default_level, &config.logging)?;

    match cli.command {
        Commands::Init => cmd::init::run(&cli.config),
        Commands::Serve { host, port, db } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(db) = db {
                config.database.path = db;
            }
            cmd::serve::run(&config)
        }
        Commands::Migrate { db } => {
            let path = db.unwrap_or(config.database.path);
            cmd::migrate::run(&path)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

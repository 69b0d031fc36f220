//! CLI entry point for the `rowcache` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use rowcache::cli::commands::{self, BufferArgs};
use rowcache::{CacheConfig, CacheError};

#[derive(Parser)]
#[command(
    name = "rowcache",
    about = "rowcache CLI: inspect run keys and shared item buffers"
)]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved run key
    RunKey {
        /// Use this key instead of resolving one
        #[arg(long = "override")]
        override_key: Option<String>,
    },
    /// Check that the shared backend is reachable
    Ping {
        /// Connection string (falls back to config, then ROWCACHE_REDIS_DSN)
        #[arg(long)]
        dsn: Option<String>,
    },
    /// Inspect or clear an item buffer
    Buffer {
        #[command(subcommand)]
        action: BufferAction,
        /// Buffer channel name
        #[arg(long, global = true, default_value = "")]
        channel: String,
        /// Key namespace
        #[arg(long, global = true)]
        namespace: Option<String>,
        /// Run key the buffer was written under
        #[arg(long, global = true)]
        run_key: Option<String>,
        /// Connection string
        #[arg(long, global = true)]
        dsn: Option<String>,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum BufferAction {
    /// Number of buffered items
    Count,
    /// Print every buffered item in append order
    Dump,
    /// Delete the buffer
    Clear,
}

fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => match CacheConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(2);
            }
        },
        None => CacheConfig::default(),
    };

    let result = match &cli.command {
        Commands::RunKey { override_key } => {
            commands::cmd_run_key(&config, override_key.as_deref(), json)
        }
        Commands::Ping { dsn } => commands::cmd_ping(&config, dsn.as_deref(), json),
        Commands::Buffer {
            action,
            channel,
            namespace,
            run_key,
            dsn,
        } => {
            let args = BufferArgs {
                channel,
                namespace: namespace.as_deref(),
                run_key: run_key.as_deref(),
                dsn: dsn.as_deref(),
            };
            match action {
                BufferAction::Count => commands::cmd_buffer_count(&config, &args, json),
                BufferAction::Dump => commands::cmd_buffer_dump(&config, &args, json),
                BufferAction::Clear => commands::cmd_buffer_clear(&config, &args, json),
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = match &e {
            CacheError::Io(_) => 1,
            CacheError::InvalidDsn(_)
            | CacheError::Config(_)
            | CacheError::MissingChannel
            | CacheError::EmptyIdentifierField => 2,
            CacheError::BackendUnavailable(_) | CacheError::Backend(_) => 3,
            _ => 5,
        };
        process::exit(code);
    }
}

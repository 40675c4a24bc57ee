mod confirm;
mod registry;
mod table;
mod versions;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stepladder_common::Error;
use stepladder_config::{AppConfig, ConfigLoader};
use stepladder_db::{Migrator, Store};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stepladder", version, about = "Apply, roll back and inspect schema migrations")]
struct Cli {
    /// Config file (YAML or TOML)
    #[arg(long, global = true, env = "STEPLADDER_CONFIG")]
    config: Option<PathBuf>,

    /// Database file, overriding the configured path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all pending migrations
    Up,
    /// Roll back the last applied migration
    Down,
    /// Show which migrations are applied and which are pending
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drop the migration ledger and re-run every migration
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    match run(cli.command, &config, confirm::confirm_reset) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let config =
        ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")?;
    apply_db_override(config, cli.db.as_deref())
}

/// `--db` wins over file and environment; the result is validated again.
fn apply_db_override(mut config: AppConfig, db: Option<&Path>) -> Result<AppConfig> {
    if let Some(db) = db {
        config.database.path = db.to_path_buf();
        config
            .validate()
            .map_err(Error::Config)
            .context("invalid --db override")?;
    }
    Ok(config)
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.to_ascii_lowercase()));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Execute one command. `confirm` is asked before a reset without `--yes`.
fn run(
    command: Command,
    config: &AppConfig,
    confirm: impl FnOnce() -> Result<bool>,
) -> Result<()> {
    let store = Store::open(&config.database).context("failed to connect to database")?;
    let migrator = Migrator::new(store, registry::migrations());

    match command {
        Command::Up => {
            migrator.up().context("migration up failed")?;
        }
        Command::Down => {
            migrator.down().context("migration down failed")?;
        }
        Command::Status { json } => {
            let report = migrator
                .status()
                .context("failed to get migration status")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for line in table::render_status(&report) {
                    println!("{line}");
                }
            }
            for record in &report.orphaned {
                warn!(
                    "ledger row {} ({}) has no registered migration step",
                    record.version, record.description
                );
            }
        }
        Command::Reset { yes } => {
            if !yes && !confirm()? {
                info!("reset cancelled");
                return Ok(());
            }
            migrator.reset().context("database reset failed")?;
        }
    }

    info!("operation completed successfully");
    Ok(())
}

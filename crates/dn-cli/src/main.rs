use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dn_cli::commands::{countdown, serve, set, status, suggest};
use dn_cli::{Cli, Commands, Config, StoreKind};
use dn_core::{AvailabilityStore, Clock, MemoryStore, Resolver, SystemClock};

/// Load config and open the configured store, ensuring the parent directory exists.
fn open_store(config_path: Option<&Path>) -> Result<(Arc<dyn AvailabilityStore>, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let store: Arc<dyn AvailabilityStore> = match config.store {
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; changes are lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreKind::Sqlite => {
            if let Some(parent) = config.database_path.parent() {
                std::fs::create_dir_all(parent).context("failed to create database directory")?;
            }
            let store = dn_db::SqliteStore::open(&config.database_path)
                .with_context(|| format!("failed to open {}", config.database_path.display()))?;
            Arc::new(store)
        }
    };
    Ok((store, config))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout();

    match &cli.command {
        Some(Commands::Serve { bind }) => {
            let (store, config) = open_store(cli.config.as_deref())?;
            let state = serve::app_state(&config, store)?;
            let bind = bind.as_deref().unwrap_or(&config.bind);
            runtime()?.block_on(serve::run(state, bind))?;
        }
        Some(Commands::Status { json }) => {
            let (store, config) = open_store(cli.config.as_deref())?;
            status::run(
                &mut stdout,
                store.as_ref(),
                &SystemClock,
                Resolver::new(config.polarity),
                config.horizon,
                *json,
            )?;
        }
        Some(Commands::Set { dates, clear }) => {
            let (store, _config) = open_store(cli.config.as_deref())?;
            set::run(&mut stdout, store.as_ref(), dates, *clear)?;
        }
        Some(Commands::Countdown { once }) => {
            let (store, config) = open_store(cli.config.as_deref())?;
            runtime()?.block_on(countdown::run(
                &mut stdout,
                store.as_ref(),
                Arc::new(SystemClock),
                Resolver::new(config.polarity),
                *once,
                ctrl_c(),
            ))?;
        }
        Some(Commands::Suggest { schedules, count }) => {
            let (store, config) = open_store(cli.config.as_deref())?;
            let api_key = config
                .resolved_api_key()
                .context("no API key configured; set api_key or ANTHROPIC_API_KEY")?;
            let client = dn_llm::Client::new(api_key).context("failed to create advisor client")?;
            runtime()?.block_on(suggest::run(
                &mut stdout,
                store.as_ref(),
                &client,
                &config,
                SystemClock.today(),
                schedules,
                count.unwrap_or(config.suggestions),
            ))?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

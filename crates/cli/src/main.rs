//! cartsync CLI - Drive the cart store from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted cart
//! cartsync show
//!
//! # Add one unit of product 1 (or one more if already in the cart)
//! cartsync add 1
//!
//! # Set product 1 to three units
//! cartsync update 1 3
//!
//! # Remove product 1
//! cartsync remove 1
//!
//! # Work offline against a json-server db.json
//! cartsync --fixture server/db.json add 2
//! ```
//!
//! Configuration comes from the environment; see `cartsync::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use cartsync::{CartConfig, ProductId};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cartsync")]
#[command(author, version, about = "Shopping cart synced with stock and a local snapshot")]
struct Cli {
    /// Serve products and stock from a json-server `db.json` instead of the API
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product's line
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Set the amount of a product already in the cart
    Update {
        /// Product ID
        product_id: ProductId,
        /// New amount (at least 1, at most the available stock)
        amount: u32,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration first (needed for Sentry init)
    let config = CartConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cartsync=info,cartsync_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CartConfig) -> Result<(), commands::CommandError> {
    let store = commands::open_store(config, cli.fixture.as_deref())?;

    match cli.command {
        Commands::Show => {}
        Commands::Add { product_id } => commands::add(&store, product_id).await?,
        Commands::Remove { product_id } => commands::remove(&store, product_id).await?,
        Commands::Update { product_id, amount } => {
            commands::update(&store, product_id, amount).await?;
        }
    }

    commands::show(&store);
    Ok(())
}

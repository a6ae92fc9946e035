//! Carpet CLI - Browse the catalog and manage a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! carpet products list --category hand-knotted --limit 12
//! carpet products show 65f1c0ffee
//!
//! # Cart and wishlist (local until signed in)
//! carpet cart add 65f1c0ffee -q 2
//! carpet wishlist toggle 65f1c0ffee
//!
//! # Email one-time-code login
//! carpet auth send-otp you@example.com
//! carpet auth verify you@example.com 123456
//!
//! # Checkout with a saved address
//! carpet checkout --email you@example.com --name "Your Name" --address-id <id>
//! ```
//!
//! State lives under `CARPET_STORAGE_DIR` (default `.carpet`). See
//! `carpet_storefront::config` for every environment variable.

#![cfg_attr(not(test), forbid(unsafe_code))]

use carpet_storefront::{Storefront, StorefrontConfig};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::CliError;

#[derive(Parser)]
#[command(name = "carpet")]
#[command(author, version, about = "Carpet Company storefront client")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true, env = "CARPET_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: commands::products::ProductsAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: commands::wishlist::WishlistAction,
    },
    /// Sign in and out
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Server-side profile
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Saved shipping addresses
    Addresses {
        #[command(subcommand)]
        action: commands::addresses::AddressesAction,
    },
    /// Saved cards
    Cards {
        #[command(subcommand)]
        action: commands::cards::CardsAction,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: commands::orders::OrdersAction,
    },
    /// Place an order for the current cart
    Checkout(commands::checkout::CheckoutArgs),
    /// Preferences
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Recently viewed products
    Recent,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Warnings and errors become Sentry events; info and debug become
/// breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "carpet_storefront=info,carpet_cli=info".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(cli.json_logs);
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry first so the tracing layer has a client to send to
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli.command, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: StorefrontConfig) -> Result<(), CliError> {
    let storefront = Storefront::from_config(config)?;
    if let Err(e) = storefront.initialize().await {
        // Catalog commands still work without a synced session
        e.report("Session sync failed at startup");
    }

    match command {
        Commands::Products { action } => commands::products::run(&storefront, action).await,
        Commands::Cart { action } => commands::cart::run(&storefront, action).await,
        Commands::Wishlist { action } => commands::wishlist::run(&storefront, action).await,
        Commands::Auth { action } => commands::auth::run(&storefront, action).await,
        Commands::Profile { action } => commands::profile::run(&storefront, action).await,
        Commands::Addresses { action } => commands::addresses::run(&storefront, action),
        Commands::Cards { action } => commands::cards::run(&storefront, action),
        Commands::Orders { action } => commands::orders::run(&storefront, action),
        Commands::Checkout(args) => commands::checkout::run(&storefront, args).await,
        Commands::Settings { action } => commands::settings::run(&storefront, action),
        Commands::Recent => commands::products::recent(&storefront),
    }
}

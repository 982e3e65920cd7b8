//! Shopfront CLI - drive the storefront pages from a terminal.
//!
//! Each command is one page load: it builds the page's controller, fires the
//! events the command names, and prints the rendered fragments and the
//! effects (alerts, navigation, cart badge) the page produced.
//!
//! # Usage
//!
//! ```bash
//! # Sign in; the session is kept in SHOPFRONT_SESSION_FILE
//! shop login -e ada@example.com -p 'correct horse'
//!
//! # Browse and buy
//! shop products --search mug --max-price 20 --page 2
//! shop add-to-cart 64f1c2 --price 12.50
//! shop cart inc 17
//! shop checkout --full-name "Ada Lovelace" --address "12 St James's Square" \
//!     --city London --zip "SW1Y 4JH" --country UK \
//!     --card-name "A Lovelace" --card-number 4242424242424242 --expiry 12/30 --cvv 123
//!
//! # Account
//! shop profile edit --name "Ada King"
//! shop orders show 42
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_API_BASE_URL` - REST API base URL (required)
//! - `SHOPFRONT_SESSION_FILE` - session file path
//! - `SHOPFRONT_REQUEST_TIMEOUT_SECS` - per-request timeout
//! - `SHOPFRONT_PROFILE_FALLBACK` - user-info fallback on the profile page
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shopfront_storefront::api::ApiError;
use shopfront_storefront::config::{ClientConfig, ConfigError};
use shopfront_storefront::controllers::PageContext;
use shopfront_storefront::session::FileSessionStore;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

/// Errors that stop a command before any page event runs.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about = "Shopfront storefront from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Page to return to afterwards
        #[arg(long)]
        redirect: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        confirm_password: String,

        /// Account type (defaults to `customer`)
        #[arg(long)]
        account_type: Option<String>,

        #[arg(long)]
        redirect: Option<String>,
    },
    /// Request a password reset link
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },
    /// Choose a new password with a reset token
    ResetPassword {
        #[arg(short, long)]
        token: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        confirm_password: String,
    },
    /// Sign out
    Logout,
    /// Home page with featured products
    Home,
    /// Product catalog
    Products {
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(long, default_value = "")]
        min_price: String,

        #[arg(long, default_value = "")]
        max_price: String,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Add one unit of a product to the cart
    AddToCart {
        product_id: String,

        /// Price shown on the product card
        #[arg(long)]
        price: String,
    },
    /// Cart page
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Place an order for the cart
    Checkout(commands::cart::CheckoutArgs),
    /// Profile page
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: Option<OrdersAction>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Increase a line's quantity by one
    Inc { item_id: String },
    /// Decrease a line's quantity by one
    Dec { item_id: String },
    /// Remove a line
    Remove { item_id: String },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show account details
    Show,
    /// Change name and, optionally, password
    Edit {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        password: String,

        #[arg(long, default_value = "")]
        confirm_password: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders
    List,
    /// Show one order
    Show { order_id: String },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
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

    // Sentry needs the config, so load it before tracing starts.
    let config = ClientConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_storefront=info,shopfront_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CliError> {
    let store = FileSessionStore::new(&config.session_file);
    let ctx = PageContext::new(config, Arc::new(store))?;

    match cli.command {
        Commands::Login {
            email,
            password,
            redirect,
        } => commands::auth::login(&ctx, email, password, redirect.as_deref()).await,
        Commands::Register {
            name,
            email,
            password,
            confirm_password,
            account_type,
            redirect,
        } => {
            let form = commands::auth::register_form(
                name,
                email,
                password,
                confirm_password,
                account_type,
            );
            commands::auth::register(&ctx, &form, redirect.as_deref()).await;
        }
        Commands::ForgotPassword { email } => commands::auth::forgot_password(&ctx, &email).await,
        Commands::ResetPassword {
            token,
            password,
            confirm_password,
        } => commands::auth::reset_password(&ctx, token, password, confirm_password).await,
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Home => commands::shop::home(&ctx).await,
        Commands::Products {
            search,
            min_price,
            max_price,
            page,
        } => commands::shop::products(&ctx, search, min_price, max_price, page).await,
        Commands::AddToCart { product_id, price } => {
            commands::shop::add_to_cart(&ctx, &product_id, &price).await?;
        }
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => commands::cart::show(&ctx).await,
            CartAction::Inc { item_id } => commands::cart::increment(&ctx, &item_id).await,
            CartAction::Dec { item_id } => commands::cart::decrement(&ctx, &item_id).await,
            CartAction::Remove { item_id } => commands::cart::remove(&ctx, &item_id).await,
        },
        Commands::Checkout(args) => commands::cart::checkout(&ctx, args).await,
        Commands::Profile { action } => match action.unwrap_or(ProfileAction::Show) {
            ProfileAction::Show => commands::account::profile(&ctx).await,
            ProfileAction::Edit {
                name,
                password,
                confirm_password,
            } => commands::account::edit_profile(&ctx, name, password, confirm_password).await,
        },
        Commands::Orders { action } => match action.unwrap_or(OrdersAction::List) {
            OrdersAction::List => commands::account::orders(&ctx).await,
            OrdersAction::Show { order_id } => commands::account::order(&ctx, &order_id).await,
        },
    }
    Ok(())
}

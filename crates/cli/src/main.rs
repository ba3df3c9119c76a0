//! Pocket Store CLI - browse the catalog, manage a cart and track orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! pstore catalog categories
//! pstore catalog products --category electronics
//! pstore catalog product 9
//!
//! # Account
//! pstore auth sign-up -e ada@example.com -p secret1 -n Ada
//! pstore auth whoami
//!
//! # Shop
//! pstore cart add 9
//! pstore checkout --full-name "Ada Lovelace" --address-line1 "12 Row" \
//!     --city London --state LDN --zip-code "N1 9GU" --country UK --phone-number 555-0100
//! pstore orders list --status new
//! pstore orders pay order_1700000000000_abc123xyz
//! ```
//!
//! Each invocation restores the persisted session before running, so the
//! cart and orders of the signed-in user are always loaded.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pocket_store::Storefront;
use pocket_store::config::StoreConfig;
use pocket_store_core::{OrderId, OrderStatus, ProductId};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "pstore")]
#[command(author, version, about = "Pocket Store command-line storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse categories and products
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Sign up, sign in and out
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart
    Checkout(commands::orders::CheckoutArgs),
    /// List and update orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List category names
    Categories,
    /// List products
    Products {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product
    Product {
        /// Product ID
        id: ProductId,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Create an account and sign in
    SignUp {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Sign in to an existing account
    SignIn {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out, keeping the cart for next time
    SignOut,
    /// Show the signed-in user
    Whoami,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product whatever its quantity
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Increase a line's quantity by one
    Inc {
        /// Product ID
        id: ProductId,
    },
    /// Decrease a line's quantity by one
    Dec {
        /// Product ID
        id: ProductId,
    },
    /// Remove every line
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        /// Only orders in this status (`new`, `paid`, `delivered`)
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Mark a new order as paid
    Pay {
        /// Order ID
        id: String,
    },
    /// Mark a paid order as delivered
    Deliver {
        /// Order ID
        id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StoreConfig) -> Option<sentry::ClientInitGuard> {
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
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pocket_store=warn,pocket_store_cli=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let mut out = std::io::stdout().lock();
    match run(cli, &config, &mut out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::App(e)) => {
            e.report();
            let _ = writeln!(std::io::stderr(), "error: {}", e.user_message());
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            let _ = writeln!(std::io::stderr(), "error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &StoreConfig, out: &mut impl Write) -> Result<(), CliError> {
    let mut storefront = Storefront::open(config).await?;
    storefront.restore_session().await?;

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Categories => commands::catalog::categories(&storefront, out).await?,
            CatalogAction::Products { category } => {
                commands::catalog::products(&storefront, category.as_deref(), out).await?;
            }
            CatalogAction::Product { id } => {
                commands::catalog::product(&storefront, id, out).await?;
            }
        },
        Commands::Auth { action } => match action {
            AuthAction::SignUp {
                email,
                password,
                name,
            } => {
                commands::auth::sign_up(&mut storefront, &email, &password, name.as_deref(), out)
                    .await?;
            }
            AuthAction::SignIn { email, password } => {
                commands::auth::sign_in(&mut storefront, &email, &password, out).await?;
            }
            AuthAction::SignOut => commands::auth::sign_out(&mut storefront, out).await?,
            AuthAction::Whoami => commands::auth::whoami(&storefront, out)?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront, out)?,
            CartAction::Add { id } => commands::cart::add(&mut storefront, id, out).await?,
            CartAction::Remove { id } => commands::cart::remove(&mut storefront, id, out).await?,
            CartAction::Inc { id } => commands::cart::increase(&mut storefront, id, out).await?,
            CartAction::Dec { id } => commands::cart::decrease(&mut storefront, id, out).await?,
            CartAction::Clear => commands::cart::clear(&mut storefront, out).await?,
        },
        Commands::Checkout(args) => commands::orders::checkout(&mut storefront, args, out).await?,
        Commands::Orders { action } => match action {
            OrdersAction::List { status } => commands::orders::list(&storefront, status, out)?,
            OrdersAction::Pay { id } => {
                commands::orders::pay(&mut storefront, &OrderId::new(id), out).await?;
            }
            OrdersAction::Deliver { id } => {
                commands::orders::deliver(&mut storefront, &OrderId::new(id), out).await?;
            }
        },
    }
    Ok(())
}

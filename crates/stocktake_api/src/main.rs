//! Stocktake (Rust)
//!
//! Counting reconciliation engine for retail inventory.
//!
//! Usage:
//!     stocktake --bind 127.0.0.1:3001 --database stocktake.sqlite3 \
//!         --shop-domain my-store.myshopify.com --shop-token shpat_...

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use stocktake_api::{router, AppState};
use stocktake_db::StocktakeDb;
use stocktake_gateway::ShopifyGateway;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "stocktake", about = "Counting reconciliation engine for retail inventory")]
struct Args {
    /// HTTP listen address
    #[arg(long, env = "STOCKTAKE_BIND", default_value = "127.0.0.1:3001")]
    bind: String,

    /// SQLite database path
    #[arg(long, env = "STOCKTAKE_DB", default_value = "stocktake.sqlite3")]
    database: PathBuf,

    /// External shop domain, e.g. my-store.myshopify.com
    #[arg(long, env = "SHOP_DOMAIN")]
    shop_domain: String,

    /// Admin API access token
    #[arg(long, env = "SHOP_TOKEN", hide_env_values = true)]
    shop_token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stocktake=info,stocktake_api=info,stocktake_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    tracing::info!("Starting Stocktake");
    tracing::info!("  Bind: {}", args.bind);
    tracing::info!("  Database: {}", args.database.display());
    tracing::info!("  Shop: {}", args.shop_domain);

    let db = StocktakeDb::open(&args.database).await?;
    let gateway = Arc::new(ShopifyGateway::new(&args.shop_domain, &args.shop_token)?);
    let state = AppState::new(db, gateway);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!("Listening on {}", args.bind);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

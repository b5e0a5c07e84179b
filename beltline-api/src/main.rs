//! beltline-api - Belt progression tracking service
//!
//! HTTP API over the shared SQLite database: user accounts, class rosters,
//! the belt rank ledger, and the evaluation waitlist.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use beltline_api::{build_router, AppState};
use beltline_common::config::Config;
use beltline_common::db::init_database;

#[derive(Debug, Parser)]
#[command(name = "beltline-api", version, about = "Belt progression tracking service")]
struct Args {
    /// Path to the configuration file
    #[arg(long, env = "BELTLINE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting beltline-api v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    info!("Database path: {}", config.database_path.display());

    let pool = match init_database(&config.database_path).await {
        Ok(pool) => {
            info!("Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let addr = std::net::SocketAddr::new(config.host, config.port);
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("beltline-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

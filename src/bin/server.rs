//! keeper server
//!
//! Stores every user's records and gates writes by version so that
//! several clients can share one vault.
//!
//! # Configuration
//!
//! Environment variables:
//! - `KEEPER_PORT`: Port to listen on (default: 3200)
//! - `KEEPER_DATABASE_PATH`: SQLite database file (default: ~/.local/share/keeper-server/keeper.db)
//! - `KEEPER_TOKEN_SECRET`: Key used to sign bearer credentials (default: random per process)
//! - `RUST_LOG`: Log filter (default: `keeper_server=info,keeper=info,tower_http=info`)
//!
//! # Endpoints
//!
//! - `GET /health`: Health check (no auth required)
//! - `POST /api/register`, `POST /api/login`: Account management (no auth required)
//! - `GET /api/vault`: The caller's live records
//! - `POST /api/records/{kind}`: Create or update a record
//! - `GET /api/records/{kind}/{title}`, `DELETE /api/records/{kind}/{title}`

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keeper::db::init_db;
use keeper::server::{self, AppState, RecordStore, ServerConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keeper_server=info,keeper=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();
    tracing::info!("Database: {}", config.database_path.display());

    let pool = init_db(&config.database_path).await?;
    let signer = config.signer()?;
    let state = AppState::new(RecordStore::new(pool), signer);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::serve(listener, state).await?;
    Ok(())
}

//! The keeper server: authoritative record store behind an HTTP/JSON API.

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod routes;
pub mod storage;

use std::sync::Arc;
use tokio::net::TcpListener;

pub use auth::{AuthUser, TokenSigner};
pub use config::ServerConfig;
pub use error::ApiError;
pub use guard::WriteGuard;
pub use storage::RecordStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub guard: Arc<WriteGuard>,
    pub signer: Arc<TokenSigner>,
}

impl AppState {
    pub fn new(store: RecordStore, signer: TokenSigner) -> Self {
        Self {
            guard: Arc::new(WriteGuard::new(store.clone())),
            store,
            signer: Arc::new(signer),
        }
    }
}

/// Serves the API on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, routes::router(state)).await
}

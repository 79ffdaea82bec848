use std::path::PathBuf;

use super::auth::{AuthError, TokenSigner};

pub const DEFAULT_PORT: u16 = 3200;

/// Server configuration, read from the environment.
///
/// - `KEEPER_PORT`: port to listen on (default: 3200)
/// - `KEEPER_DATABASE_PATH`: SQLite file (default: ~/.local/share/keeper-server/keeper.db)
/// - `KEEPER_TOKEN_SECRET`: key for signing credentials (default: random per process)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: PathBuf,
    pub token_secret: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("KEEPER_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let database_path = lookup("KEEPER_DATABASE_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("keeper-server")
                    .join("keeper.db")
            });

        let token_secret = lookup("KEEPER_TOKEN_SECRET").filter(|s| !s.is_empty());

        Self {
            port,
            database_path,
            token_secret,
        }
    }

    pub fn signer(&self) -> Result<TokenSigner, AuthError> {
        match &self.token_secret {
            Some(secret) => TokenSigner::new(secret.as_bytes()),
            None => {
                tracing::warn!(
                    "KEEPER_TOKEN_SECRET is not set; using a random key, credentials will not survive a restart"
                );
                TokenSigner::random()
            }
        }
    }
}

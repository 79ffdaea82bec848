//! Password hashing, bearer credentials and the auth middleware.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::OnceLock;

use super::error::ApiError;
use super::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("signing key rejected: {0}")]
    InvalidKey(String),
    #[error("malformed credential")]
    Malformed,
    #[error("credential signature mismatch")]
    BadSignature,
}

/// Authenticated caller, added to request extensions by [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Hashes a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt = [0u8; 16];
    rand::rng().fill(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| AuthError::Hash(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

/// Checks a login attempt. An unknown login is checked against a fixed
/// hash so it costs the same as a wrong password.
pub fn verify_login(password: &str, phc: Option<&str>) -> bool {
    match phc {
        Some(phc) => verify_password(password, phc),
        None => {
            verify_password(password, dummy_hash());
            false
        }
    }
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        hash_password("keeper-unknown-login").unwrap_or_else(|e| {
            tracing::warn!("Could not prepare dummy hash: {}", e);
            String::new()
        })
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    iat: i64,
}

/// Issues and checks bearer credentials of the form
/// `base64url(claims) "." base64url(hmac_sha256(claims))`.
#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
}

impl TokenSigner {
    pub fn new(secret: &[u8]) -> Result<Self, AuthError> {
        let mac =
            HmacSha256::new_from_slice(secret).map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    /// A signer with a fresh random key. Credentials do not survive a restart.
    pub fn random() -> Result<Self, AuthError> {
        let mut secret = [0u8; 32];
        rand::rng().fill(&mut secret);
        Self::new(&secret)
    }

    pub fn issue(&self, user_id: i64) -> String {
        let claims = Claims {
            sub: user_id,
            iat: Utc::now().timestamp(),
        };
        // Claims is two integers; serialization cannot fail.
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let body = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(body.as_bytes()));
        format!("{}.{}", body, signature)
    }

    /// Returns the user id a credential was issued for.
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        let (body, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Malformed)?;

        let mut mac = self.mac.clone();
        mac.update(body.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| AuthError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| AuthError::Malformed)?;
        Ok(claims.sub)
    }

    fn sign(&self, bytes: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(bytes);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Rejects requests without a valid bearer credential for an existing user.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::unauthenticated("authorization header must use Bearer scheme")
            })?,
        None => return Err(ApiError::unauthenticated("authorization header required")),
    };

    let user_id = state.signer.verify(&token).map_err(|e| {
        tracing::debug!("Rejected credential: {}", e);
        ApiError::unauthenticated("invalid credential")
    })?;

    if !state.store.user_exists(user_id).await? {
        return Err(ApiError::unauthenticated("unknown user"));
    }

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}

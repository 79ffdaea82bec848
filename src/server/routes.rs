//! HTTP routes, one per RPC.
//!
//! - `GET /health`: liveness (no auth)
//! - `POST /api/register`, `POST /api/login`: issue credentials (no auth)
//! - `GET /api/vault`: full snapshot of the caller's live records
//! - `GET|DELETE /api/records/{kind}/{title}`: read or soft-delete one title
//! - `POST /api/records/{kind}`: write a record through the guard

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use std::str::FromStr;
use tower_http::trace::TraceLayer;

use super::auth::{hash_password, require_auth, verify_login, AuthUser};
use super::error::ApiError;
use super::AppState;
use crate::api::{
    Credentials, HealthResponse, LoginResponse, RecordResponse, RegisterResponse, StatusResponse,
    VaultResponse, STATUS_LOGGED_IN, STATUS_NOT_FOUND, STATUS_REGISTERED, STATUS_SUCCESS,
};
use crate::models::{Kind, Record};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/register", post(register))
        .route("/api/login", post(login));

    let protected_routes = Router::new()
        .route("/api/vault", get(vault))
        .route("/api/records/{kind}", post(post_record))
        .route(
            "/api/records/{kind}/{title}",
            get(get_record).delete(delete_record),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn read_credentials(
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Credentials, ApiError> {
    let Json(credentials) = body.map_err(|e| ApiError::InvalidArgument(e.body_text()))?;
    if credentials.login.trim().is_empty() || credentials.pass.is_empty() {
        return Err(ApiError::InvalidArgument(
            "login and password are required".to_string(),
        ));
    }
    Ok(credentials)
}

fn parse_kind(kind: &str) -> Result<Kind, ApiError> {
    Kind::from_str(kind).map_err(ApiError::InvalidArgument)
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let credentials = read_credentials(body)?;

    let pass = credentials.pass.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&pass))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let user = state.store.create_user(&credentials.login, &hash).await?;
    tracing::info!("Registered user {} ({})", user.login, user.id);

    Ok(Json(RegisterResponse {
        status: STATUS_REGISTERED.to_string(),
        token: state.signer.issue(user.id),
    }))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let credentials = read_credentials(body)?;

    let stored = state.store.find_user(&credentials.login).await?;
    let pass = credentials.pass.clone();
    let phc = stored.as_ref().map(|user| user.password_hash.clone());
    let verified = tokio::task::spawn_blocking(move || verify_login(&pass, phc.as_deref()))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = match stored {
        Some(user) if verified => user,
        _ => {
            tracing::info!("Failed login for {}", credentials.login);
            return Err(ApiError::unauthenticated("invalid login or password"));
        }
    };

    let snapshot = state.store.snapshot(user.id).await?;
    tracing::info!("User {} logged in, {} records", user.login, snapshot.len());

    Ok(Json(LoginResponse {
        status: STATUS_LOGGED_IN.to_string(),
        token: state.signer.issue(user.id),
        vault: snapshot,
    }))
}

async fn vault(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<VaultResponse>, ApiError> {
    let snapshot = state.store.snapshot(user.user_id).await?;
    Ok(Json(VaultResponse {
        status: STATUS_SUCCESS.to_string(),
        vault: snapshot,
    }))
}

async fn get_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((kind, title)): Path<(String, String)>,
) -> Result<Json<RecordResponse>, ApiError> {
    let kind = parse_kind(&kind)?;

    match state.store.latest(user.user_id, kind, &title).await? {
        Some(record) => Ok(Json(RecordResponse {
            status: STATUS_SUCCESS.to_string(),
            record,
        })),
        None => Err(ApiError::NotFound(STATUS_NOT_FOUND.to_string())),
    }
}

async fn post_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
    body: Result<Json<Record>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let Json(mut record) = body.map_err(|e| ApiError::InvalidArgument(e.body_text()))?;

    if record.kind() != kind {
        return Err(ApiError::InvalidArgument(format!(
            "payload kind {} does not match path kind {}",
            record.kind(),
            kind
        )));
    }
    // Delete state is server-owned.
    record.deleted_at = None;

    state.guard.write(user.user_id, &record).await?;
    Ok(Json(StatusResponse::success()))
}

async fn delete_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((kind, title)): Path<(String, String)>,
) -> Result<Json<StatusResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    state.guard.delete(user.user_id, kind, &title).await?;
    Ok(Json(StatusResponse::success()))
}

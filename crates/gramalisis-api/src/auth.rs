use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, warn};
use uuid::Uuid;

use gramalisis_db::Database;
use gramalisis_progress::{Catalog, CatalogKind};
use gramalisis_types::api::{
    ChangePasswordRequest, Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};

use crate::accounts::{self, AccountError};
use crate::feed::EntryFeed;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub feed: EntryFeed,
    pub stages: Catalog,
    pub levels: Catalog,
}

impl AppStateInner {
    pub fn catalog(&self, kind: CatalogKind) -> &Catalog {
        match kind {
            CatalogKind::Stages => &self.stages,
            CatalogKind::Levels => &self.levels,
        }
    }
}

/// Run a blocking database job off the async runtime.
pub(crate) async fn blocking<T, F>(job: F) -> Result<T, StatusCode>
where
    F: FnOnce() -> Result<T, StatusCode> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
}

pub(crate) fn account_status(e: AccountError) -> StatusCode {
    let status = e.status();
    if status.is_server_error() {
        error!("Account operation failed: {}", e);
    } else {
        warn!("Account request rejected: {}", e);
    }
    status
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let profile = blocking(move || accounts::register_account(&db, &req).map_err(account_status))
        .await?;

    let token = create_token(&state.jwt_secret, profile.uid, &profile.username).map_err(|e| {
        error!("Token encoding failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: profile.uid,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let profile = blocking(move || {
        accounts::verify_credentials(&db, &req.email, &req.password).map_err(account_status)
    })
    .await?;

    let token = create_token(&state.jwt_secret, profile.uid, &profile.username).map_err(|e| {
        error!("Token encoding failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(LoginResponse {
        user_id: profile.uid,
        username: profile.username,
        token,
    }))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    blocking(move || accounts::change_password(&db, claims.sub, &req).map_err(account_status))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

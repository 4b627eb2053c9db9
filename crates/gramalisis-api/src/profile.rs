use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use gramalisis_types::ProfileUpdate;
use gramalisis_types::api::Claims;

use crate::accounts;
use crate::auth::{AppState, account_status, blocking};

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let profile = blocking(move || {
        accounts::load_profile(&db, claims.sub)
            .map_err(account_status)?
            .ok_or(StatusCode::NOT_FOUND)
    })
    .await?;

    Ok(Json(profile))
}

/// Merge the edit into the stored profile. The level cannot be edited here.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(update): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let profile = blocking(move || {
        let mut profile = accounts::load_profile(&db, claims.sub)
            .map_err(account_status)?
            .ok_or(StatusCode::NOT_FOUND)?;
        profile.apply(update);
        accounts::save_profile(&db, &profile).map_err(account_status)
    })
    .await?;

    Ok(Json(profile))
}

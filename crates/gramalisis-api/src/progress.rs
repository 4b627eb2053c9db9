use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;

use gramalisis_db::Database;
use gramalisis_progress::{Catalog, CatalogKind, Progress, ProgressReport};
use gramalisis_types::api::Claims;
use uuid::Uuid;

use crate::auth::{AppState, blocking};

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    #[serde(default)]
    pub catalog: CatalogKind,
}

/// Progress of `uid` against `catalog`, with the stored level as a floor.
/// Blocking.
pub fn progress_for(db: &Database, catalog: &Catalog, uid: Uuid) -> anyhow::Result<Option<ProgressReport>> {
    let id = uid.to_string();
    let Some(user) = db.get_user_by_id(&id)? else {
        return Ok(None);
    };
    let count = db.count_entries(&id)?;
    Ok(Some(Progress::new(catalog, count).report(Some(user.level))))
}

pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ProgressQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let app = state.clone();
    let report = blocking(move || {
        progress_for(&app.db, app.catalog(query.catalog), claims.sub)
            .map_err(|e| {
                error!("Loading progress failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::NOT_FOUND)
    })
    .await?;

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gramalisis_db::models::NewUser;
    use gramalisis_types::text::summarize;

    use crate::convert::entry_to_row;

    #[test]
    fn test_progress_counts_stored_entries() {
        let db = Database::open_in_memory().unwrap();
        let uid = Uuid::new_v4();
        db.create_user(&NewUser {
            id: &uid.to_string(),
            email: "ana@example.com",
            password_hash: "hash",
            first_name: "Ana",
            last_name: "Ruiz",
            job: "Docente",
        })
        .unwrap();

        for text in ["uno", "dos", "tres"] {
            let entry = gramalisis_types::Entry {
                id: Uuid::new_v4(),
                uid,
                text: text.into(),
                summary: summarize(text),
                created_at: None,
            };
            db.insert_entry(&entry_to_row(&entry, chrono::Utc::now())).unwrap();
        }

        let stages = Catalog::learning_stages();
        let report = progress_for(&db, &stages, uid).unwrap().unwrap();
        assert_eq!(report.entries_count, 3);
        assert_eq!(report.current.order, 2);
        assert_eq!(report.effective_order, 2);

        // a stored level above the computed one is kept
        db.raise_level(&uid.to_string(), 4).unwrap();
        let report = progress_for(&db, &stages, uid).unwrap().unwrap();
        assert_eq!(report.current.order, 2);
        assert_eq!(report.effective_order, 4);

        assert!(progress_for(&db, &stages, Uuid::new_v4()).unwrap().is_none());
    }
}

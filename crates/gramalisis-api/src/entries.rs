use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::SubsecRound;
use tracing::{error, info, warn};
use uuid::Uuid;

use gramalisis_db::Database;
use gramalisis_types::Entry;
use gramalisis_types::api::{Claims, CreateEntryRequest};
use gramalisis_types::text::{normalize_entry_text, summarize};

use crate::auth::{AppState, blocking};
use crate::convert::{entry_to_row, load_entries};
use crate::feed::EntryFeed;

/// Write a new entry and push the owner's fresh snapshot to the feed.
///
/// `text` must already be trimmed and non-empty. Blocking.
pub fn store_entry(
    db: &Database,
    feed: &EntryFeed,
    uid: Uuid,
    text: &str,
) -> anyhow::Result<Entry> {
    // Stored at microsecond precision; keep the returned copy identical
    let now = chrono::Utc::now().trunc_subsecs(6);
    let entry = Entry {
        id: Uuid::new_v4(),
        uid,
        text: text.to_string(),
        summary: summarize(text),
        created_at: Some(now),
    };
    db.insert_entry(&entry_to_row(&entry, now))?;
    info!(%uid, entry_id = %entry.id, "entry stored");

    // The write already succeeded; a failed refresh only delays subscribers
    if let Err(e) = feed.publish(uid, || load_entries(db, uid)) {
        warn!(%uid, "entry snapshot publish failed: {}", e);
    }
    Ok(entry)
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let entries = blocking(move || {
        load_entries(&db, claims.sub).map_err(|e| {
            error!("Loading entries failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
    })
    .await?;

    Ok(Json(entries))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let text = normalize_entry_text(&req.text)
        .ok_or(StatusCode::BAD_REQUEST)?
        .to_string();

    let db = state.db.clone();
    let feed = state.feed.clone();
    let entry = blocking(move || {
        store_entry(&db, &feed, claims.sub, &text).map_err(|e| {
            error!("Storing entry failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gramalisis_db::models::NewUser;

    fn seeded() -> (Database, Uuid) {
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
        (db, uid)
    }

    #[tokio::test]
    async fn test_store_entry_publishes_newest_first() {
        let (db, uid) = seeded();
        let feed = EntryFeed::new();
        let mut rx = feed.subscribe(uid, || load_entries(&db, uid)).unwrap();
        assert!(rx.recv().await.unwrap().is_empty());

        store_entry(&db, &feed, uid, "primera").unwrap();
        let second = store_entry(&db, &feed, uid, "segunda entrada").unwrap();
        assert_eq!(second.summary, "2 palabras • 14 caracteres");

        assert_eq!(rx.recv().await.unwrap().len(), 1);
        let latest = rx.recv().await.unwrap();
        let texts: Vec<&str> = latest.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["segunda entrada", "primera"]);
        assert_eq!(latest[0], second);
    }

    #[test]
    fn test_store_entry_unknown_user_fails() {
        let (db, _) = seeded();
        let feed = EntryFeed::new();
        assert!(store_entry(&db, &feed, Uuid::new_v4(), "hola").is_err());
    }
}

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use gramalisis_db::Database;
use gramalisis_db::models::{EntryRow, UserRow};
use gramalisis_types::{Entry, UserProfile};

/// Format used for every timestamp we write, so text order is time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str, owner: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's CURRENT_TIMESTAMP has no zone; it is UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .inspect_err(|e| warn!("Corrupt created_at '{}' on '{}': {}", raw, owner, e))
        .ok()
}

fn parse_id(raw: &str, what: &str, owner: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on '{}': {}", what, raw, owner, e);
        Uuid::default()
    })
}

pub fn entry_from_row(row: EntryRow) -> Entry {
    Entry {
        id: parse_id(&row.id, "entry id", &row.id),
        uid: parse_id(&row.uid, "uid", &row.id),
        created_at: parse_timestamp(&row.created_at, &row.id),
        text: row.text,
        summary: row.summary,
    }
}

pub fn entry_to_row(entry: &Entry, created_at: DateTime<Utc>) -> EntryRow {
    EntryRow {
        id: entry.id.to_string(),
        uid: entry.uid.to_string(),
        text: entry.text.clone(),
        summary: entry.summary.clone(),
        created_at: format_timestamp(created_at),
    }
}

pub fn profile_from_row(row: &UserRow) -> UserProfile {
    UserProfile {
        uid: parse_id(&row.id, "user id", &row.id),
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
        username: row.email.clone(),
        job: row.job.clone(),
        photo_url: row.photo_url.clone(),
        level: row.level.max(1),
    }
}

/// A user's entries as the feed and the list endpoint serve them.
pub fn load_entries(db: &Database, uid: Uuid) -> anyhow::Result<Vec<Entry>> {
    let rows = db.get_entries(&uid.to_string())?;
    Ok(rows.into_iter().map(entry_from_row).collect())
}

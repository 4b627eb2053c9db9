use crate::Database;
use crate::models::{EntryRow, NewUser, ProfileColumns, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

const USER_COLUMNS: &str =
    "id, email, password, first_name, last_name, job, photo_url, level, created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, first_name, last_name, job) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    user.id,
                    user.email,
                    user.password_hash,
                    user.first_name,
                    user.last_name,
                    user.job
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Overwrite the editable profile columns. Returns false if no such user.
    pub fn update_profile(&self, id: &str, profile: &ProfileColumns<'_>) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET first_name = ?2, last_name = ?3, email = ?4, job = ?5, photo_url = ?6 WHERE id = ?1",
                rusqlite::params![
                    id,
                    profile.first_name,
                    profile.last_name,
                    profile.email,
                    profile.job,
                    profile.photo_url
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?2 WHERE id = ?1",
                (id, password_hash),
            )?;
            Ok(changed > 0)
        })
    }

    /// Raise the stored level. Never lowers it.
    pub fn raise_level(&self, id: &str, level: u32) -> Result<u32> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET level = MAX(level, ?2) WHERE id = ?1",
                rusqlite::params![id, level],
            )?;
            let stored: u32 =
                conn.query_row("SELECT level FROM users WHERE id = ?1", [id], |row| row.get(0))?;
            Ok(stored)
        })
    }

    // -- Entries --

    pub fn insert_entry(&self, entry: &EntryRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO entries (id, uid, text, summary, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![entry.id, entry.uid, entry.text, entry.summary, entry.created_at],
            )?;
            Ok(())
        })
    }

    /// All entries of a user, newest first.
    pub fn get_entries(&self, uid: &str) -> Result<Vec<EntryRow>> {
        self.with_conn(|conn| query_entries(conn, uid))
    }

    pub fn count_entries(&self, uid: &str) -> Result<u32> {
        self.with_conn(|conn| {
            let count: u32 = conn.query_row(
                "SELECT COUNT(*) FROM entries WHERE uid = ?1",
                [uid],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        job: row.get(5)?,
        photo_url: row.get(6)?,
        level: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is one of our own constants, never user input
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt.query_row([value], user_from_row).optional()?;

    Ok(row)
}

fn query_entries(conn: &Connection, uid: &str) -> Result<Vec<EntryRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, uid, text, summary, created_at
         FROM entries
         WHERE uid = ?1
         ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt
        .query_map([uid], |row| {
            Ok(EntryRow {
                id: row.get(0)?,
                uid: row.get(1)?,
                text: row.get(2)?,
                summary: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

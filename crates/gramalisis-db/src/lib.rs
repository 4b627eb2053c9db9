pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Users and their entries in one SQLite connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        // Readers don't block the writer
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!(path = %path.display(), "database ready");
        Ok(db)
    }

    /// Fresh private database, used by tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with exclusive use of the connection. Statements are
    /// autocommit, so a panic in an earlier caller leaves nothing half-applied
    /// and the lock is taken over.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryRow;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    #[test]
    fn test_entries_require_existing_user() {
        let db = Database::open_in_memory().unwrap();
        let orphan = EntryRow {
            id: "e1".into(),
            uid: "nobody".into(),
            text: "hola".into(),
            summary: "1 palabras • 4 caracteres".into(),
            created_at: "2024-01-01T00:00:00.000000Z".into(),
        };
        assert!(db.insert_entry(&orphan).is_err());
    }

    #[test]
    fn test_connection_survives_panicking_caller() {
        let db = Database::open_in_memory().unwrap();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _ = db.with_conn(|_| -> Result<()> { panic!("caller bug") });
        }));
        assert!(result.is_err());

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_open_file_database_twice() {
        let path = std::env::temp_dir().join(format!("gramalisis-{}.db", std::process::id()));
        Database::open(&path).unwrap();
        // migrations are idempotent
        let db = Database::open(&path).unwrap();
        assert!(db.get_user_by_email("ana@example.com").unwrap().is_none());
        drop(db);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}

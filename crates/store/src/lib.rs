//! Relational persistence for uploaded documents and their entities.
//!
//! A single SQLite connection sits behind a `Mutex`; every operation takes it
//! through [`DocumentStore::with_session`], which releases it on return.

mod document;
mod error;
mod migrations;

pub use document::Document;
pub use error::StoreError;

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

/// Cloneable handle to the `documents` table.
#[derive(Clone)]
pub struct DocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentStore {
    /// Opens (or creates) the database file and applies pending migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        migrations::run_all(&mut conn)?;

        tracing::info!(path = %path.display(), "Document store opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut conn = Connection::open_in_memory()?;
        migrations::run_all(&mut conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive access to the connection.
    ///
    /// The lock is held only for the duration of `f`, on success and on error.
    pub fn with_session<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut conn)
    }
}

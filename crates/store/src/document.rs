use rusqlite::{params, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{DocumentStore, StoreError};

/// A stored upload: its name, extracted text and JSON-encoded entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub content: String,
    pub entities: String,
}

impl Document {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            filename: row.get("filename")?,
            content: row.get("content")?,
            entities: row.get("entities")?,
        })
    }

    /// Decodes the stored entity JSON.
    pub fn entities_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.entities)
    }
}

impl DocumentStore {
    /// Inserts one document and returns its id.
    ///
    /// The insert runs in its own transaction; if anything fails the
    /// transaction is dropped uncommitted and nothing is written.
    pub fn create<E>(&self, filename: &str, content: &str, entities: &E) -> Result<i64, StoreError>
    where
        E: Serialize + ?Sized,
    {
        let entities = serde_json::to_string(entities)?;

        let id = self.with_session(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO documents (filename, content, entities) VALUES (?1, ?2, ?3)",
                params![filename, content, entities],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })?;

        tracing::debug!(document_id = id, filename, "Document stored");
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Result<Option<Document>, StoreError> {
        self.with_session(|conn| {
            let document = conn
                .query_row(
                    "SELECT id, filename, content, entities FROM documents WHERE id = ?1",
                    params![id],
                    Document::from_row,
                )
                .optional()?;
            Ok(document)
        })
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        self.with_session(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
            Ok(count as u64)
        })
    }
}

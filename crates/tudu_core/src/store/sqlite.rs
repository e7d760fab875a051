//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist documents of every collection in one `documents` table.
//! - Keep SQL details inside this adapter.
//!
//! # Invariants
//! - `fields` column always holds a JSON object.
//! - Merge-updates read and write inside one transaction.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::now_epoch_ms;
use crate::store::{
    generate_doc_id, merge_fields, CollectionPath, DocPath, Document, DocumentStore, Fields,
    StoreError, StoreResult,
};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// `DocumentStore` persisted in a local SQLite file.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a migrated in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> StoreResult<T>) -> StoreResult<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite store lock poisoned".to_string()))?;
        f(&mut conn)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<String> {
        self.with_conn(|conn| insert_document(conn, collection, &fields))
    }

    async fn get_all(&self, collection: &CollectionPath) -> StoreResult<Vec<Document>> {
        self.with_conn(|conn| select_collection(conn, collection))
    }

    async fn update(&self, doc: &DocPath, fields: Fields) -> StoreResult<()> {
        self.with_conn(|conn| merge_document(conn, doc, fields))
    }

    async fn delete(&self, doc: &DocPath) -> StoreResult<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![doc.collection.as_str(), doc.id.as_str()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(doc.clone()));
            }
            Ok(())
        })
    }
}

fn insert_document(
    conn: &Connection,
    collection: &CollectionPath,
    fields: &Fields,
) -> StoreResult<String> {
    let body = serde_json::to_string(fields)?;
    let now = now_epoch_ms();
    loop {
        let doc_id = generate_doc_id();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO documents (collection, doc_id, fields, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4);",
            params![collection.as_str(), doc_id.as_str(), body.as_str(), now],
        )?;
        if inserted == 1 {
            return Ok(doc_id);
        }
    }
}

fn select_collection(conn: &Connection, collection: &CollectionPath) -> StoreResult<Vec<Document>> {
    let mut stmt = conn.prepare(
        "SELECT doc_id, fields
         FROM documents
         WHERE collection = ?1
         ORDER BY created_at ASC, doc_id ASC;",
    )?;
    let mut rows = stmt.query([collection.as_str()])?;
    let mut docs = Vec::new();
    while let Some(row) = rows.next()? {
        let body: String = row.get("fields")?;
        docs.push(Document {
            id: row.get("doc_id")?,
            fields: serde_json::from_str(&body)?,
        });
    }
    Ok(docs)
}

fn merge_document(conn: &mut Connection, doc: &DocPath, patch: Fields) -> StoreResult<()> {
    let tx = conn.transaction()?;
    let body: Option<String> = tx
        .query_row(
            "SELECT fields FROM documents WHERE collection = ?1 AND doc_id = ?2;",
            params![doc.collection.as_str(), doc.id.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    let Some(body) = body else {
        return Err(StoreError::NotFound(doc.clone()));
    };

    let mut fields: Fields = serde_json::from_str(&body)?;
    merge_fields(&mut fields, patch);
    tx.execute(
        "UPDATE documents
         SET fields = ?3,
             updated_at = ?4
         WHERE collection = ?1 AND doc_id = ?2;",
        params![
            doc.collection.as_str(),
            doc.id.as_str(),
            serde_json::to_string(&fields)?,
            now_epoch_ms(),
        ],
    )?;
    tx.commit()?;
    Ok(())
}

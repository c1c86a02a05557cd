//! SQLite Document Store
//! Mission: Persist JSON documents per collection in a single SQLite table

use super::{Document, DocumentStore, Filter, ObjectId, StoreError, ID_FIELD};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Open (or create) the store at `db_path`. `:memory:` gives a private in-memory store.
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(db_path)?
        };
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                UNIQUE (collection, id)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Candidate rows for `filter`: a point lookup when it pins `_id`, else the whole collection.
    fn candidates(
        conn: &Connection,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let rows: Vec<(String, String)> = match filter.id() {
            Some(id) => conn
                .query_row(
                    "SELECT id, body FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?
                .into_iter()
                .collect(),
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY seq ASC",
                )?;
                let rows = stmt
                    .query_map(params![collection], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        let mut out = Vec::with_capacity(rows.len());
        for (id, body) in rows {
            let doc = match serde_json::from_str::<Value>(&body)? {
                Value::Object(map) => map,
                _ => {
                    return Err(StoreError::NotAnObject {
                        collection: collection.to_string(),
                        id,
                    })
                }
            };
            if filter.matches(&doc) {
                out.push((id, doc));
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let conn = self.conn.lock().await;
        Ok(Self::candidates(&conn, collection, filter)?
            .into_iter()
            .next()
            .map(|(_, doc)| doc))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let conn = self.conn.lock().await;
        Ok(Self::candidates(&conn, collection, filter)?
            .into_iter()
            .map(|(_, doc)| doc)
            .collect())
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut doc: Document,
    ) -> Result<ObjectId, StoreError> {
        let id = match doc.get(ID_FIELD).and_then(Value::as_str).map(ObjectId::parse) {
            Some(Ok(id)) => id,
            _ => ObjectId::new(),
        };
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_hex()));
        let body = serde_json::to_string(&doc)?;

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection, id.to_hex(), body],
        )?;

        debug!(collection, id = %id, "inserted document");
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> Result<bool, StoreError> {
        let conn = self.conn.lock().await;
        let Some((id, mut doc)) = Self::candidates(&conn, collection, filter)?
            .into_iter()
            .next()
        else {
            return Ok(false);
        };

        for (field, value) in set {
            if field != ID_FIELD {
                doc.insert(field, value);
            }
        }
        let body = serde_json::to_string(&doc)?;
        conn.execute(
            "UPDATE documents SET body = ?1 WHERE collection = ?2 AND id = ?3",
            params![body, collection, id],
        )?;

        debug!(collection, id = %id, "updated document");
        Ok(true)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError> {
        let conn = self.conn.lock().await;
        let Some((id, _)) = Self::candidates(&conn, collection, filter)?
            .into_iter()
            .next()
        else {
            return Ok(false);
        };

        let deleted = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;

        debug!(collection, id = %id, "deleted document");
        Ok(deleted > 0)
    }
}

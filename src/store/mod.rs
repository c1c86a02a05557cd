//! Document Store
//! Mission: Opaque JSON document storage with find / insert / update / delete

pub mod object_id;
pub mod sqlite;

pub use object_id::{InvalidObjectId, ObjectId};
pub use sqlite::SqliteDocumentStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// A stored JSON object. `_id` holds the hex form of its [`ObjectId`].
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("document serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stored document is not a JSON object (collection {collection}, id {id})")]
    NotAnObject { collection: String, id: String },
}

/// Conjunction of field equality tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: ObjectId) -> Self {
        Self::new().eq(ID_FIELD, id.to_hex())
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    /// The `_id` clause, if the filter pins one. Lets backends skip a scan.
    pub fn id(&self) -> Option<&str> {
        self.clauses
            .iter()
            .find(|(field, _)| field == ID_FIELD)
            .and_then(|(_, value)| value.as_str())
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

/// Storage seam used by the credential store and the residency collaborators.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, collection: &str, filter: &Filter)
        -> Result<Option<Document>, StoreError>;

    /// All matching documents, in insertion order.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Stores `doc`, assigning `_id` when it has none, and returns the id.
    async fn insert_one(&self, collection: &str, doc: Document) -> Result<ObjectId, StoreError>;

    /// Applies `set` field by field to the first match. `_id` is never rewritten.
    /// Returns whether a document matched.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> Result<bool, StoreError>;

    /// Returns whether a document was deleted.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError>;
}

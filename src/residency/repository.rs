//! Residency Repository
//! Mission: Single-document data access for residencies and their sub-entities

use crate::residency::models::ApplicationStatus;
use crate::store::{Document, DocumentStore, Filter, ObjectId, StoreError, ID_FIELD};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub const RESIDENCIES: &str = "residencies";
pub const BLOCKS: &str = "blocks";
pub const ROOMS: &str = "rooms";
pub const APPLICATIONS: &str = "applications";
pub const REVIEWS: &str = "reviews";

/// Blocks and rooms are served with `block_id` / `room_id` in place of `_id`.
fn rename_id(mut doc: Document, key: &str) -> Document {
    if let Some(id) = doc.remove(ID_FIELD) {
        doc.insert(key.to_string(), id);
    }
    doc
}

/// Update bodies may not move a document or rename it.
fn strip_identity(mut doc: Document, keys: &[&str]) -> Document {
    for key in keys {
        doc.remove(*key);
    }
    doc
}

fn hex(id: ObjectId) -> Value {
    Value::String(id.to_hex())
}

pub struct ResidencyRepository {
    store: Arc<dyn DocumentStore>,
}

impl ResidencyRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // Residencies

    pub async fn list_residencies(&self) -> Result<Vec<Document>, StoreError> {
        self.store.find(RESIDENCIES, &Filter::new()).await
    }

    pub async fn get_residency(&self, id: ObjectId) -> Result<Option<Document>, StoreError> {
        self.store.find_one(RESIDENCIES, &Filter::by_id(id)).await
    }

    pub async fn insert_residency(&self, doc: Document) -> Result<ObjectId, StoreError> {
        let doc = strip_identity(doc, &[ID_FIELD]);
        self.store.insert_one(RESIDENCIES, doc).await
    }

    pub async fn update_residency(&self, id: ObjectId, set: Document) -> Result<bool, StoreError> {
        self.store
            .update_one(RESIDENCIES, &Filter::by_id(id), set)
            .await
    }

    pub async fn delete_residency(&self, id: ObjectId) -> Result<bool, StoreError> {
        self.store.delete_one(RESIDENCIES, &Filter::by_id(id)).await
    }

    // Blocks

    pub async fn list_blocks(&self, residency_id: ObjectId) -> Result<Vec<Document>, StoreError> {
        let blocks = self
            .store
            .find(BLOCKS, &Filter::new().eq("residency_id", residency_id.to_hex()))
            .await?;
        Ok(blocks.into_iter().map(|b| rename_id(b, "block_id")).collect())
    }

    pub async fn get_block(&self, id: ObjectId) -> Result<Option<Document>, StoreError> {
        Ok(self
            .store
            .find_one(BLOCKS, &Filter::by_id(id))
            .await?
            .map(|b| rename_id(b, "block_id")))
    }

    pub async fn insert_block(
        &self,
        residency_id: ObjectId,
        doc: Document,
    ) -> Result<ObjectId, StoreError> {
        let mut doc = strip_identity(doc, &[ID_FIELD, "block_id"]);
        doc.insert("residency_id".to_string(), hex(residency_id));
        self.store.insert_one(BLOCKS, doc).await
    }

    pub async fn update_block(&self, id: ObjectId, set: Document) -> Result<bool, StoreError> {
        let set = strip_identity(set, &["block_id", "residency_id"]);
        self.store.update_one(BLOCKS, &Filter::by_id(id), set).await
    }

    pub async fn delete_block(&self, id: ObjectId) -> Result<bool, StoreError> {
        self.store.delete_one(BLOCKS, &Filter::by_id(id)).await
    }

    // Rooms

    pub async fn list_rooms(&self, block_id: ObjectId) -> Result<Vec<Document>, StoreError> {
        let rooms = self
            .store
            .find(ROOMS, &Filter::new().eq("block_id", block_id.to_hex()))
            .await?;
        Ok(rooms.into_iter().map(|r| rename_id(r, "room_id")).collect())
    }

    pub async fn get_room(&self, id: ObjectId) -> Result<Option<Document>, StoreError> {
        Ok(self
            .store
            .find_one(ROOMS, &Filter::by_id(id))
            .await?
            .map(|r| rename_id(r, "room_id")))
    }

    pub async fn insert_room(&self, block_id: ObjectId, doc: Document) -> Result<ObjectId, StoreError> {
        let mut doc = strip_identity(doc, &[ID_FIELD, "room_id"]);
        doc.insert("block_id".to_string(), hex(block_id));
        self.store.insert_one(ROOMS, doc).await
    }

    pub async fn update_room(&self, id: ObjectId, set: Document) -> Result<bool, StoreError> {
        let set = strip_identity(set, &["room_id", "block_id"]);
        self.store.update_one(ROOMS, &Filter::by_id(id), set).await
    }

    pub async fn delete_room(&self, id: ObjectId) -> Result<bool, StoreError> {
        self.store.delete_one(ROOMS, &Filter::by_id(id)).await
    }

    // Applications

    pub async fn list_applications(&self) -> Result<Vec<Document>, StoreError> {
        self.store.find(APPLICATIONS, &Filter::new()).await
    }

    pub async fn get_application(&self, id: ObjectId) -> Result<Option<Document>, StoreError> {
        self.store.find_one(APPLICATIONS, &Filter::by_id(id)).await
    }

    /// Stored as pending, owned by `username`. `application_id` mirrors `_id`.
    pub async fn insert_application(
        &self,
        username: &str,
        mut doc: Document,
    ) -> Result<ObjectId, StoreError> {
        let id = ObjectId::new();
        doc.insert(ID_FIELD.to_string(), hex(id));
        doc.insert("application_id".to_string(), hex(id));
        doc.insert("username".to_string(), Value::String(username.to_string()));
        doc.insert(
            "status".to_string(),
            Value::String(ApplicationStatus::Pending.as_str().to_string()),
        );
        self.store.insert_one(APPLICATIONS, doc).await
    }

    pub async fn set_application_status(
        &self,
        id: ObjectId,
        status: ApplicationStatus,
    ) -> Result<bool, StoreError> {
        let mut set = Document::new();
        set.insert("status".to_string(), Value::String(status.as_str().to_string()));

        let updated = self
            .store
            .update_one(APPLICATIONS, &Filter::by_id(id), set)
            .await?;
        if updated {
            info!("Application {} marked {}", id, status.as_str());
        }
        Ok(updated)
    }

    /// Only deletes when `username` owns the application.
    pub async fn delete_application(&self, id: ObjectId, username: &str) -> Result<bool, StoreError> {
        let deleted = self
            .store
            .delete_one(APPLICATIONS, &Filter::by_id(id).eq("username", username))
            .await?;
        if !deleted {
            warn!("No application {} owned by {}", id, username);
        }
        Ok(deleted)
    }

    // Reviews

    pub async fn list_reviews(&self) -> Result<Vec<Document>, StoreError> {
        self.store.find(REVIEWS, &Filter::new()).await
    }

    pub async fn get_review(&self, id: ObjectId) -> Result<Option<Document>, StoreError> {
        self.store.find_one(REVIEWS, &Filter::by_id(id)).await
    }

    /// Stamped with the author and an RFC 3339 timestamp. `review_id` mirrors `_id`.
    pub async fn insert_review(&self, username: &str, mut doc: Document) -> Result<ObjectId, StoreError> {
        let id = ObjectId::new();
        doc.insert(ID_FIELD.to_string(), hex(id));
        doc.insert("review_id".to_string(), hex(id));
        doc.insert("username".to_string(), Value::String(username.to_string()));
        doc.insert("timestamp".to_string(), Value::String(Utc::now().to_rfc3339()));
        self.store.insert_one(REVIEWS, doc).await
    }

    /// Only deletes when `username` wrote the review.
    pub async fn delete_review(&self, id: ObjectId, username: &str) -> Result<bool, StoreError> {
        let deleted = self
            .store
            .delete_one(REVIEWS, &Filter::by_id(id).eq("username", username))
            .await?;
        if !deleted {
            warn!("No review {} by {}", id, username);
        }
        Ok(deleted)
    }
}

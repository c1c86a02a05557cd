//! Residency API Endpoints
//! Mission: Residency, block and room management plus student applications and reviews

use crate::api::ApiError;
use crate::auth::{RequireAdmin, RequireStudent};
use crate::residency::{
    models::{self, StatusUpdate},
    repository::ResidencyRepository,
};
use crate::store::{Document, ObjectId};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

type Repo = State<Arc<ResidencyRepository>>;
type Body = Result<Json<Value>, JsonRejection>;

fn body(payload: Body) -> Result<Document, ApiError> {
    let Json(value) = payload?;
    models::into_document(value)
}

fn created(message: &str, key: &str, id: ObjectId) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({ "message": message, key: id.to_hex() })),
    )
}

fn done(message: &str) -> Json<Value> {
    Json(json!({ "message": message }))
}

/// `residency_id` in a body must name an existing residency.
async fn referenced_residency(repo: &ResidencyRepository, doc: &Document) -> Result<(), ApiError> {
    let id = doc
        .get("residency_id")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Validation("Invalid identifier".to_string()))?;
    let id = ObjectId::parse(id)?;
    repo.get_residency(id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Residency"))
}

// ============================================================================
// Residencies
// ============================================================================

/// GET /residencies
pub async fn list_residencies(State(repo): Repo) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(repo.list_residencies().await?))
}

/// GET /residencies/:id
pub async fn get_residency(
    State(repo): Repo,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let id = ObjectId::parse(&id)?;
    repo.get_residency(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Residency"))
}

/// POST /residencies
pub async fn create_residency(
    RequireAdmin(admin): RequireAdmin,
    State(repo): Repo,
    payload: Body,
) -> Result<impl IntoResponse, ApiError> {
    let doc = body(payload)?;
    models::require_fields(&doc, models::RESIDENCY_FIELDS)?;

    let id = repo.insert_residency(doc).await?;
    info!("Residency {} created by {}", id, admin.username);
    Ok(created("Residency created successfully", "residency_id", id))
}

/// PUT /residencies/:id
pub async fn update_residency(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(id): Path<String>,
    payload: Body,
) -> Result<Json<Value>, ApiError> {
    let id = ObjectId::parse(&id)?;
    let set = body(payload)?;

    if repo.update_residency(id, set).await? {
        Ok(done("Residency updated successfully"))
    } else {
        Err(ApiError::not_found("Residency"))
    }
}

/// DELETE /residencies/:id
pub async fn delete_residency(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = ObjectId::parse(&id)?;

    if repo.delete_residency(id).await? {
        Ok(done("Residency deleted successfully"))
    } else {
        Err(ApiError::not_found("Residency"))
    }
}

// ============================================================================
// Blocks
// ============================================================================

/// GET /residencies/:residency_id/blocks
pub async fn list_blocks(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(residency_id): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let residency_id = ObjectId::parse(&residency_id)?;
    Ok(Json(repo.list_blocks(residency_id).await?))
}

/// POST /residencies/:residency_id/blocks
pub async fn create_block(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(residency_id): Path<String>,
    payload: Body,
) -> Result<impl IntoResponse, ApiError> {
    let residency_id = ObjectId::parse(&residency_id)?;
    let doc = body(payload)?;
    models::require_fields(&doc, models::BLOCK_FIELDS)?;

    if repo.get_residency(residency_id).await?.is_none() {
        return Err(ApiError::not_found("Residency"));
    }

    let id = repo.insert_block(residency_id, doc).await?;
    Ok(created("Block created successfully", "block_id", id))
}

/// GET /blocks/:block_id
pub async fn get_block(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(block_id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let block_id = ObjectId::parse(&block_id)?;
    repo.get_block(block_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Block"))
}

/// PUT /blocks/:block_id
pub async fn update_block(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(block_id): Path<String>,
    payload: Body,
) -> Result<Json<Value>, ApiError> {
    let block_id = ObjectId::parse(&block_id)?;
    let set = body(payload)?;

    if repo.update_block(block_id, set).await? {
        Ok(done("Block updated successfully"))
    } else {
        Err(ApiError::not_found("Block"))
    }
}

/// DELETE /blocks/:block_id
pub async fn delete_block(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(block_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let block_id = ObjectId::parse(&block_id)?;

    if repo.delete_block(block_id).await? {
        Ok(done("Block deleted successfully"))
    } else {
        Err(ApiError::not_found("Block"))
    }
}

// ============================================================================
// Rooms
// ============================================================================

/// GET /blocks/:block_id/rooms
pub async fn list_rooms(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(block_id): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let block_id = ObjectId::parse(&block_id)?;
    Ok(Json(repo.list_rooms(block_id).await?))
}

/// POST /blocks/:block_id/rooms
pub async fn create_room(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(block_id): Path<String>,
    payload: Body,
) -> Result<impl IntoResponse, ApiError> {
    let block_id = ObjectId::parse(&block_id)?;
    let doc = body(payload)?;
    models::require_fields(&doc, models::ROOM_FIELDS)?;

    if repo.get_block(block_id).await?.is_none() {
        return Err(ApiError::not_found("Block"));
    }

    let id = repo.insert_room(block_id, doc).await?;
    Ok(created("Room created successfully", "room_id", id))
}

/// GET /rooms/:room_id
pub async fn get_room(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(room_id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let room_id = ObjectId::parse(&room_id)?;
    repo.get_room(room_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Room"))
}

/// PUT /rooms/:room_id
pub async fn update_room(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(room_id): Path<String>,
    payload: Body,
) -> Result<Json<Value>, ApiError> {
    let room_id = ObjectId::parse(&room_id)?;
    let set = body(payload)?;

    if repo.update_room(room_id, set).await? {
        Ok(done("Room updated successfully"))
    } else {
        Err(ApiError::not_found("Room"))
    }
}

/// DELETE /rooms/:room_id
pub async fn delete_room(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(room_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let room_id = ObjectId::parse(&room_id)?;

    if repo.delete_room(room_id).await? {
        Ok(done("Room deleted successfully"))
    } else {
        Err(ApiError::not_found("Room"))
    }
}

// ============================================================================
// Applications
// ============================================================================

/// GET /applications
pub async fn list_applications(
    _admin: RequireAdmin,
    State(repo): Repo,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(repo.list_applications().await?))
}

/// GET /applications/:id
pub async fn get_application(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let id = ObjectId::parse(&id)?;
    repo.get_application(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Application"))
}

/// POST /applications
pub async fn create_application(
    RequireStudent(student): RequireStudent,
    State(repo): Repo,
    payload: Body,
) -> Result<impl IntoResponse, ApiError> {
    let doc = body(payload)?;
    models::require_fields(&doc, models::APPLICATION_FIELDS)?;
    referenced_residency(&repo, &doc).await?;

    let doc = models::pick(&doc, models::APPLICATION_FIELDS);
    let id = repo.insert_application(&student.username, doc).await?;
    info!("Application {} submitted by {}", id, student.username);
    Ok(created("Application submitted successfully", "application_id", id))
}

/// PUT /applications/:id/status
pub async fn update_application_status(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = ObjectId::parse(&id)?;
    let Json(update) = payload?;

    if repo.set_application_status(id, update.status).await? {
        Ok(done("Application status updated successfully"))
    } else {
        Err(ApiError::not_found("Application"))
    }
}

/// DELETE /applications/:id
/// Someone else's application reads as not found.
pub async fn delete_application(
    RequireStudent(student): RequireStudent,
    State(repo): Repo,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = ObjectId::parse(&id)?;

    if repo.delete_application(id, &student.username).await? {
        Ok(done("Application deleted successfully"))
    } else {
        Err(ApiError::not_found("Application"))
    }
}

// ============================================================================
// Reviews
// ============================================================================

/// GET /reviews
pub async fn list_reviews(
    _admin: RequireAdmin,
    State(repo): Repo,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(repo.list_reviews().await?))
}

/// GET /reviews/:id
pub async fn get_review(
    _admin: RequireAdmin,
    State(repo): Repo,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let id = ObjectId::parse(&id)?;
    repo.get_review(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Review"))
}

/// POST /reviews
pub async fn create_review(
    RequireStudent(student): RequireStudent,
    State(repo): Repo,
    payload: Body,
) -> Result<impl IntoResponse, ApiError> {
    let doc = body(payload)?;
    models::require_fields(&doc, models::REVIEW_FIELDS)?;
    if let Some(rating) = doc.get("rating") {
        models::validate_rating(rating)?;
    }
    referenced_residency(&repo, &doc).await?;

    let doc = models::pick(&doc, models::REVIEW_FIELDS);
    let id = repo.insert_review(&student.username, doc).await?;
    Ok(created("Review submitted successfully", "review_id", id))
}

/// DELETE /reviews/:id
pub async fn delete_review(
    RequireStudent(student): RequireStudent,
    State(repo): Repo,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = ObjectId::parse(&id)?;

    if repo.delete_review(id, &student.username).await? {
        Ok(done("Review deleted successfully"))
    } else {
        Err(ApiError::not_found("Review"))
    }
}

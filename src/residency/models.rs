//! Residency Models
//! Mission: Required-field validation for residency, block, room, application and review bodies

use crate::api::ApiError;
use crate::store::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const RESIDENCY_FIELDS: &[&str] = &["Residency_Type", "Residency", "city"];
pub const BLOCK_FIELDS: &[&str] = &["block_name", "number_of_floors", "total_rooms"];
pub const ROOM_FIELDS: &[&str] = &["room_number", "floor", "capacity", "is_available"];
pub const APPLICATION_FIELDS: &[&str] = &["residency_id", "preferred_roommate", "disease_status"];
pub const REVIEW_FIELDS: &[&str] = &["residency_id", "rating", "review_text"];

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// Body of PUT /applications/:id/status
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

/// A request body must be a non-empty JSON object.
pub fn into_document(body: Value) -> Result<Document, ApiError> {
    match body {
        Value::Object(doc) if !doc.is_empty() => Ok(doc),
        _ => Err(ApiError::Validation("Invalid input".to_string())),
    }
}

/// Absent and `null` both count as missing.
pub fn require_fields(doc: &Document, fields: &[&str]) -> Result<(), ApiError> {
    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| matches!(doc.get(*field), None | Some(Value::Null)))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::missing_fields(&missing))
    }
}

/// Copy just `fields` out of `doc`.
pub fn pick(doc: &Document, fields: &[&str]) -> Document {
    fields
        .iter()
        .filter_map(|field| doc.get(*field).map(|v| (field.to_string(), v.clone())))
        .collect()
}

pub fn validate_rating(rating: &Value) -> Result<(), ApiError> {
    match rating.as_f64() {
        Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => Ok(()),
        _ => Err(ApiError::Validation(format!(
            "rating must be a number between {} and {}",
            MIN_RATING, MAX_RATING
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_into_document_rejects_empty_and_non_objects() {
        assert!(into_document(json!({"city": "Sfax"})).is_ok());
        assert!(into_document(json!({})).is_err());
        assert!(into_document(json!([1, 2])).is_err());
        assert!(into_document(Value::Null).is_err());
    }

    #[test]
    fn test_require_fields_names_what_is_missing() {
        let block = doc(json!({"block_name": "A", "total_rooms": null}));

        match require_fields(&block, BLOCK_FIELDS) {
            Err(ApiError::Validation(message)) => assert_eq!(
                message,
                "Missing required fields: number_of_floors, total_rooms"
            ),
            other => panic!("expected validation error, got {other:?}"),
        }

        let complete = doc(json!({"block_name": "A", "number_of_floors": 4, "total_rooms": 40}));
        assert!(require_fields(&complete, BLOCK_FIELDS).is_ok());
    }

    #[test]
    fn test_pick_drops_unlisted_fields() {
        let body = doc(json!({
            "residency_id": "r1",
            "preferred_roommate": "",
            "disease_status": "none",
            "status": "approved",
        }));
        let picked = pick(&body, APPLICATION_FIELDS);
        assert_eq!(picked.len(), 3);
        assert!(!picked.contains_key("status"));
    }

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(&json!(1)).is_ok());
        assert!(validate_rating(&json!(4.5)).is_ok());
        assert!(validate_rating(&json!(5)).is_ok());
        assert!(validate_rating(&json!(0)).is_err());
        assert!(validate_rating(&json!(6)).is_err());
        assert!(validate_rating(&json!("5")).is_err());
    }

    #[test]
    fn test_status_update_parsing() {
        let update: StatusUpdate = serde_json::from_value(json!({"status": "approved"})).unwrap();
        assert_eq!(update.status, ApplicationStatus::Approved);
        assert!(serde_json::from_value::<StatusUpdate>(json!({"status": "maybe"})).is_err());
    }
}

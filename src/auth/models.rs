//! Authentication Models
//! Mission: Define user, claim and request shapes for the auth layer

use crate::store::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stored user record. Serialized form is the `users` collection document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    #[serde(rename = "password")]
    pub password_hash: String, // bcrypt digest
    pub role: UserRole,
}

/// User roles. Disjoint populations, not a privilege ladder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UserRole {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "student")]
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Student => "student",
        }
    }

    /// Exact match only; "Admin" is not a role.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "student" => Some(UserRole::Student),
            _ => None,
        }
    }

    /// Profile fields a registration for this role must carry.
    pub fn profile_fields(&self) -> &'static [&'static str] {
        match self {
            UserRole::Admin => &["first_name", "last_name"],
            UserRole::Student => &["first_name", "last_name", "year_of_study", "university"],
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub username: String,
    pub role: UserRole,
    pub exp: i64, // unix seconds
}

/// Identity attached to a single request once the gate has accepted its token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub role: UserRole,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Registration body. Everything is optional here so missing fields surface as
/// a validation error instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// Login request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64, // seconds until expiration
    pub username: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_role_serialization() {
        let admin = UserRole::Admin;
        let json = serde_json::to_string(&admin).unwrap();
        assert_eq!(json, r#""admin""#);

        let student: UserRole = serde_json::from_str(r#""student""#).unwrap();
        assert_eq!(student, UserRole::Student);

        let bad: Result<UserRole, _> = serde_json::from_str(r#""superuser""#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_user_role_parse_is_exact() {
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("student"), Some(UserRole::Student));
        assert_eq!(UserRole::parse("ADMIN"), None);
        assert_eq!(UserRole::parse("teacher"), None);
        assert_eq!(UserRole::Student.to_string(), "student");
    }

    #[test]
    fn test_user_document_shape() {
        let user = User {
            id: ObjectId::parse("65a1b2c3d4e5f60718293a4b").unwrap(),
            username: "amira".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            role: UserRole::Student,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            json!({
                "_id": "65a1b2c3d4e5f60718293a4b",
                "username": "amira",
                "password": "$2b$04$hash",
                "role": "student",
            })
        );
    }

    #[test]
    fn test_register_request_collects_profile_fields() {
        let req: RegisterRequest = serde_json::from_value(json!({
            "username": "amira",
            "password": "s3cretpass",
            "role": "student",
            "first_name": "Amira",
            "university": "INSAT",
        }))
        .unwrap();

        assert_eq!(req.username.as_deref(), Some("amira"));
        assert_eq!(req.role.as_deref(), Some("student"));
        assert_eq!(req.profile.get("first_name"), Some(&json!("Amira")));
        assert!(!req.profile.contains_key("username"));
    }
}

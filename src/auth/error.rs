//! Auth error taxonomy and its HTTP mapping

use crate::auth::jwt::TokenError;
use crate::auth::password::HashError;
use crate::auth::user_store::UserStoreError;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("Invalid role")]
    InvalidRole,
    #[error("{0}")]
    InvalidField(String),
    #[error("User already exists")]
    DuplicateUser,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Token is missing")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token has expired")]
    Expired,
    // Same wording as InvalidToken on purpose.
    #[error("Invalid token")]
    Revoked,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("internal auth failure: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingFields(_) | AuthError::InvalidRole | AuthError::InvalidField(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::DuplicateUser => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::Expired
            | AuthError::Revoked
            | AuthError::PermissionDenied => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to the client.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::Expired,
            TokenError::SignatureInvalid | TokenError::Malformed => AuthError::InvalidToken,
            TokenError::Encoding(detail) => AuthError::Internal(detail),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

impl From<HashError> for AuthError {
    fn from(e: HashError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

impl From<UserStoreError> for AuthError {
    fn from(e: UserStoreError) -> Self {
        match e {
            UserStoreError::Duplicate => AuthError::DuplicateUser,
            UserStoreError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            error!("Auth internal error: {}", detail);
        }

        let status = self.status_code();
        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}

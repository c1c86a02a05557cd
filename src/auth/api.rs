//! Authentication API Endpoints
//! Mission: Provide register, login, logout and whoami endpoints

use crate::api::ApiError;
use crate::auth::{
    error::AuthError,
    middleware::bearer_token,
    models::{Identity, LoginRequest, LoginResponse, RegisterRequest},
    service::AuthService,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Register endpoint - POST /auth/register
pub async fn register(
    State(auth): State<Arc<AuthService>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;

    auth.register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// Login endpoint - POST /auth/login
pub async fn login(
    State(auth): State<Arc<AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;

    Ok(Json(auth.login(payload).await?))
}

/// Logout endpoint - POST /auth/logout
/// Not behind the gate: a missing token is a 400 here, not a 403.
pub async fn logout(
    State(auth): State<Arc<AuthService>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    match auth.logout(bearer_token(&headers)).await {
        Ok(()) => Ok(Json(json!({ "message": "Logged out successfully" }))),
        Err(AuthError::MissingToken) => Err(ApiError::Validation("Token is missing".to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Get current identity - GET /auth/me
/// Built from the token claims, no database lookup.
pub async fn me(identity: Identity) -> Json<Identity> {
    Json(identity)
}

//! Authentication Middleware
//! Mission: Gate protected routes on a valid bearer token

use crate::auth::{
    error::AuthError,
    models::{Identity, UserRole},
    service::{authorize, AuthService},
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

const BEARER_PREFIX: &str = "bearer ";

/// Token from `Authorization`, with or without a `Bearer ` prefix (any case).
/// A bare scheme with nothing after it counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim_start();
    let token = match value.get(..BEARER_PREFIX.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER_PREFIX) => &value[BEARER_PREFIX.len()..],
        _ => value,
    }
    .trim();

    // HTTP parsers drop trailing whitespace, so "Bearer " arrives as "Bearer".
    if token.is_empty() || token.eq_ignore_ascii_case(BEARER_PREFIX.trim_end()) {
        None
    } else {
        Some(token)
    }
}

/// Route gate: rejects before the handler runs, otherwise attaches the
/// request's [`Identity`] to its extensions.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers()).map(str::to_owned);

    let identity = auth.authenticate(token.as_deref()).await?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Extract identity from request (use after auth middleware)
pub fn extract_identity(parts: &Parts) -> Result<Identity, AuthError> {
    parts
        .extensions
        .get::<Identity>()
        .cloned()
        .ok_or(AuthError::MissingToken)
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_identity(parts)
    }
}

fn identity_with_role(parts: &Parts, role: UserRole) -> Result<Identity, AuthError> {
    let identity = extract_identity(parts)?;
    if authorize(&identity, role) {
        Ok(identity)
    } else {
        Err(AuthError::PermissionDenied)
    }
}

/// Handler argument that only admits admins.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_with_role(parts, UserRole::Admin).map(RequireAdmin)
    }
}

/// Handler argument that only admits students.
#[derive(Debug, Clone)]
pub struct RequireStudent(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for RequireStudent
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_with_role(parts, UserRole::Student).map(RequireStudent)
    }
}

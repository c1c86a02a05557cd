//! Router assembly.
//!
//! Three routers are merged: public reads, the auth endpoints, and everything behind
//! the token gate. Role checks happen per handler through `RequireAdmin` / `RequireStudent`.

use crate::api::AppState;
use crate::auth::{api as auth_api, auth_middleware};
use crate::middleware::request_logging;
use crate::residency::api as residency_api;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/residencies", get(residency_api::list_residencies))
        .route("/residencies/:id", get(residency_api::get_residency))
        .with_state(state.clone());

    let auth_routes = Router::new()
        .route("/auth/register", post(auth_api::register))
        .route("/auth/login", post(auth_api::login))
        .route("/auth/logout", post(auth_api::logout))
        .with_state(state.auth.clone());

    let protected_routes = Router::new()
        .route("/auth/me", get(auth_api::me))
        // Residencies
        .route("/residencies", post(residency_api::create_residency))
        .route(
            "/residencies/:id",
            put(residency_api::update_residency).delete(residency_api::delete_residency),
        )
        // Blocks
        .route(
            "/residencies/:residency_id/blocks",
            get(residency_api::list_blocks).post(residency_api::create_block),
        )
        .route(
            "/blocks/:block_id",
            get(residency_api::get_block)
                .put(residency_api::update_block)
                .delete(residency_api::delete_block),
        )
        // Rooms
        .route(
            "/blocks/:block_id/rooms",
            get(residency_api::list_rooms).post(residency_api::create_room),
        )
        .route(
            "/rooms/:room_id",
            get(residency_api::get_room)
                .put(residency_api::update_room)
                .delete(residency_api::delete_room),
        )
        // Applications
        .route(
            "/applications",
            get(residency_api::list_applications).post(residency_api::create_application),
        )
        .route(
            "/applications/:id",
            get(residency_api::get_application).delete(residency_api::delete_application),
        )
        .route(
            "/applications/:id/status",
            put(residency_api::update_application_status),
        )
        // Reviews
        .route(
            "/reviews",
            get(residency_api::list_reviews).post(residency_api::create_review),
        )
        .route(
            "/reviews/:id",
            get(residency_api::get_review).delete(residency_api::delete_review),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

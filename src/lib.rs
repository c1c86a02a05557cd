//! Residency Backend Library
//!
//! Exposes the service modules for the `residency` binary and integration tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod residency;
pub mod store;

pub use api::{build_state, router, AppState};
pub use config::Config;

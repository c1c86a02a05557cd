//! HTTP surface: shared state, router assembly and error mapping.

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::router;

use crate::auth::{
    AuthService, JwtHandler, MemoryRevocationRegistry, PasswordHasher, RevocationRegistry,
    SqliteRevocationRegistry, UserStore,
};
use crate::config::{Config, RevocationBackend};
use crate::residency::ResidencyRepository;
use crate::store::{DocumentStore, SqliteDocumentStore};
use anyhow::{Context, Result};
use axum::extract::FromRef;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub residencies: Arc<ResidencyRepository>,
    pub revocations: Arc<dyn RevocationRegistry>,
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for Arc<ResidencyRepository> {
    fn from_ref(state: &AppState) -> Self {
        state.residencies.clone()
    }
}

/// Open the stores and wire the services described by `config`.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let store: Arc<dyn DocumentStore> = Arc::new(
        SqliteDocumentStore::open(&config.db_path)
            .with_context(|| format!("Failed to open document store at {}", config.db_path))?,
    );

    let revocations: Arc<dyn RevocationRegistry> = match config.revocation_backend {
        RevocationBackend::Memory => Arc::new(MemoryRevocationRegistry::new()),
        RevocationBackend::Sqlite => Arc::new(
            SqliteRevocationRegistry::open(&config.db_path)
                .context("Failed to open revocation registry")?,
        ),
    };
    info!("Revocation registry: {:?}", config.revocation_backend);

    let auth = AuthService::new(
        UserStore::new(store.clone()),
        PasswordHasher::new(config.bcrypt_cost),
        JwtHandler::with_ttl(&config.jwt_secret, config.token_ttl()),
        revocations.clone(),
    )
    .await
    .context("Failed to initialise authentication")?;

    if let Some((username, password)) = config.bootstrap_admin() {
        auth.ensure_admin(username, password)
            .await
            .context("Failed to create bootstrap admin")?;
    }

    Ok(AppState {
        auth: Arc::new(auth),
        residencies: Arc::new(ResidencyRepository::new(store)),
        revocations,
    })
}

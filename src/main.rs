//! Residency API server
//!
//! Residence hall management: residencies, blocks and rooms for admins,
//! applications and reviews for students, behind token authentication.

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use residency_backend::{auth::revocation::revocation_pruning_polling, build_state, router, Config};
use std::path::Path;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = Config::parse();
    config.validate().context("Invalid configuration")?;

    info!("Residency API starting");

    let state = build_state(&config).await?;
    info!("Document store opened at: {}", config.db_path);

    tokio::spawn(revocation_pruning_polling(
        state.revocations.clone(),
        config.prune_interval(),
    ));

    let app = router(state);

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("API server listening on {}", config.bind);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "residency_backend=debug,residency=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate's own .env when launched from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}

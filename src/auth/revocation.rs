//! Token Revocation
//! Mission: Remember tokens that were logged out before their natural expiry

use crate::store::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Set of explicitly invalidated tokens, keyed by the exact token string.
///
/// Each entry carries the token's own `exp`. Once that passes the codec rejects the
/// token on expiry alone, so `prune` may forget it.
#[async_trait]
pub trait RevocationRegistry: Send + Sync {
    /// Idempotent.
    async fn revoke(&self, token: &str, expires_at: i64) -> Result<(), StoreError>;

    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError>;

    /// Drop entries with `expires_at <= now`. Returns how many went.
    async fn prune(&self, now: i64) -> Result<usize, StoreError>;
}

/// Process-local registry. Revocations are not visible to other instances.
#[derive(Default)]
pub struct MemoryRevocationRegistry {
    entries: RwLock<HashMap<String, i64>>,
}

impl MemoryRevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl RevocationRegistry for MemoryRevocationRegistry {
    async fn revoke(&self, token: &str, expires_at: i64) -> Result<(), StoreError> {
        self.entries
            .write()
            .entry(token.to_string())
            .or_insert(expires_at);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.entries.read().contains_key(token))
    }

    async fn prune(&self, now: i64) -> Result<usize, StoreError> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        Ok(before - entries.len())
    }
}

/// Registry kept in SQLite, so every process pointed at the same file sees one set.
#[derive(Clone)]
pub struct SqliteRevocationRegistry {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRevocationRegistry {
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(db_path)?
        };
        conn.pragma_update(None, "journal_mode", "WAL").ok();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS revoked_tokens (
                token TEXT PRIMARY KEY,
                expires_at INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_revoked_tokens_expires ON revoked_tokens(expires_at)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl RevocationRegistry for SqliteRevocationRegistry {
    async fn revoke(&self, token: &str, expires_at: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR IGNORE INTO revoked_tokens (token, expires_at) VALUES (?1, ?2)",
            params![token, expires_at],
        )?;
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM revoked_tokens WHERE token = ?1",
            params![token],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn prune(&self, now: i64) -> Result<usize, StoreError> {
        let conn = self.conn.lock().await;
        let removed = conn.execute(
            "DELETE FROM revoked_tokens WHERE expires_at <= ?1",
            params![now],
        )?;
        Ok(removed)
    }
}

/// Periodically forget revocations whose tokens have expired on their own.
pub async fn revocation_pruning_polling(registry: Arc<dyn RevocationRegistry>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match registry.prune(Utc::now().timestamp()).await {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "Pruned expired token revocations"),
            Err(e) => warn!("Revocation pruning failed: {}", e),
        }
    }
}

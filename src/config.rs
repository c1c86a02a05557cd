//! Runtime configuration, read from flags or environment.

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use std::time::Duration;

pub const MIN_SECRET_BYTES: usize = 32;
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;

/// Where logout revocations are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RevocationBackend {
    /// Process-local, lost on restart
    Memory,
    /// Shared through the database file
    Sqlite,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "residency")]
#[command(about = "Residence hall management API")]
pub struct Config {
    /// Listen address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    pub bind: String,

    /// SQLite database file (":memory:" for a throwaway store)
    #[arg(long, env = "DB_PATH", default_value = "residency.db")]
    pub db_path: String,

    /// Token signing secret, at least 32 bytes
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Token lifetime in seconds
    #[arg(long, env = "TOKEN_TTL_SECS", default_value = "3600")]
    pub token_ttl_secs: i64,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value = "12")]
    pub bcrypt_cost: u32,

    #[arg(long, env = "REVOCATION_BACKEND", value_enum, default_value = "memory")]
    pub revocation_backend: RevocationBackend,

    /// Seconds between sweeps of expired revocations
    #[arg(long, env = "REVOCATION_PRUNE_SECS", default_value = "300")]
    pub revocation_prune_secs: u64,

    /// Admin created at startup when none exists
    #[arg(long, env = "ADMIN_USERNAME")]
    pub admin_username: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < MIN_SECRET_BYTES {
            bail!("JWT_SECRET must be at least {} bytes", MIN_SECRET_BYTES);
        }
        if self.token_ttl_secs <= 0 || self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!(
                "TOKEN_TTL_SECS must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_SECS,
                self.token_ttl_secs
            );
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31, got {}", self.bcrypt_cost);
        }
        if self.revocation_prune_secs == 0 {
            bail!("REVOCATION_PRUNE_SECS must be positive");
        }
        if self.admin_username.is_some() != self.admin_password.is_some() {
            bail!("ADMIN_USERNAME and ADMIN_PASSWORD must be set together");
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_secs)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.revocation_prune_secs)
    }

    /// Bootstrap admin credentials, when both halves are configured.
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

//! Password Hashing
//! Mission: Salted one-way bcrypt digests, computed off the async runtime

use bcrypt::{hash, verify, DEFAULT_COST};

/// Minimum password length in bytes
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (bcrypt has a 72-byte limit)
pub const MAX_PASSWORD_LENGTH: usize = 72;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("malformed password digest: {0}")]
    Format(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Two calls on the same input give different digests; both verify.
    pub async fn hash(&self, password: &str) -> Result<String, HashError> {
        let password = password.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || {
            hash(password, cost).map_err(|e| HashError::Hashing(e.to_string()))
        })
        .await?
    }

    /// `Ok(false)` on a wrong password; `Err(Format)` only when `digest` is not a bcrypt digest.
    pub async fn verify(&self, password: &str, digest: &str) -> Result<bool, HashError> {
        let password = password.to_string();
        let digest = digest.to_string();

        // Every bcrypt verify error comes from parsing the digest.
        tokio::task::spawn_blocking(move || {
            verify(password, &digest).map_err(|e| HashError::Format(e.to_string()))
        })
        .await?
    }
}

//! JWT Token Handler
//! Mission: Mint and validate signed, expiring bearer tokens

use crate::auth::models::{Claims, UserRole};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::debug;

/// Reference token lifetime.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature does not match")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// JWT Handler for token operations (HS256)
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtHandler {
    /// Create a new JWT handler with the reference one-hour lifetime
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        // Expiry is checked by hand so that `exp == now` already counts as expired.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign `{username, role, exp = now + ttl}`.
    pub fn encode(&self, username: &str, role: UserRole) -> Result<(String, Claims), TokenError> {
        let claims = Claims {
            username: username.to_string(),
            role,
            exp: Utc::now()
                .checked_add_signed(self.ttl)
                .ok_or_else(|| TokenError::Encoding("Invalid timestamp".to_string()))?
                .timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        debug!(
            "Generated JWT for {} ({}), expires at {}",
            claims.username, claims.role, claims.exp
        );

        Ok((token, claims))
    }

    /// Verify signature, then expiry, and return the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let decoded = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed,
            },
        )?;

        if decoded.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(decoded.claims)
    }
}

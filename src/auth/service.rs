//! Auth Service
//! Mission: Register, log in, log out and gate requests on bearer tokens
//!
//! A session moves `Anonymous -> Authenticated -> (Expired | Revoked | LoggedOut)`.
//! Nothing here holds per-session state except the revocation registry: a token is
//! live while its signature holds, its `exp` is in the future and it has not been
//! revoked.

use crate::auth::{
    error::AuthError,
    jwt::JwtHandler,
    models::{Identity, LoginRequest, LoginResponse, RegisterRequest, User, UserRole},
    password::{PasswordHasher, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH},
    revocation::RevocationRegistry,
    user_store::UserStore,
};
use crate::store::Document;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Strict role equality. An admin does not satisfy a student-only check.
pub fn authorize(identity: &Identity, required: UserRole) -> bool {
    identity.role == required
}

/// The value when present and non-blank; otherwise records `name` as missing.
fn required(name: &str, value: Option<String>, missing: &mut Vec<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(name.to_string());
            String::new()
        }
    }
}

pub struct AuthService {
    users: UserStore,
    hasher: PasswordHasher,
    tokens: JwtHandler,
    revocations: Arc<dyn RevocationRegistry>,
    // Verified against when the username is unknown, so both failure paths cost one bcrypt.
    dummy_hash: String,
}

impl AuthService {
    pub async fn new(
        users: UserStore,
        hasher: PasswordHasher,
        tokens: JwtHandler,
        revocations: Arc<dyn RevocationRegistry>,
    ) -> Result<Self, AuthError> {
        let dummy_hash = hasher.hash("residency-dummy-password").await?;
        Ok(Self {
            users,
            hasher,
            tokens,
            revocations,
            dummy_hash,
        })
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn tokens(&self) -> &JwtHandler {
        &self.tokens
    }

    /// Validate shape, then uniqueness, then store. No session is created.
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AuthError> {
        let RegisterRequest {
            username,
            password,
            role,
            profile,
        } = req;

        let mut missing = Vec::new();
        let username = required("username", username, &mut missing);
        let password = required("password", password, &mut missing);
        let role = required("role", role, &mut missing);
        if !missing.is_empty() {
            return Err(AuthError::MissingFields(missing));
        }

        let role = UserRole::parse(&role).ok_or(AuthError::InvalidRole)?;
        let profile = Self::role_profile(role, profile)?;

        if password.len() < MIN_PASSWORD_LENGTH || password.len() > MAX_PASSWORD_LENGTH {
            return Err(AuthError::InvalidField(format!(
                "Password must be between {} and {} bytes",
                MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
            )));
        }

        if self.users.get_user_by_username(&username).await?.is_some() {
            warn!("Registration rejected, username taken: {}", username);
            return Err(AuthError::DuplicateUser);
        }

        let password_hash = self.hasher.hash(&password).await?;
        let user = self
            .users
            .create_user(&username, password_hash, role, Some(profile))
            .await?;

        info!("Registered user: {} ({})", user.username, user.role);
        Ok(user)
    }

    /// Keep only the fields the role defines, failing if any is absent.
    fn role_profile(role: UserRole, mut fields: Document) -> Result<Document, AuthError> {
        let mut profile = Document::new();
        let mut missing = Vec::new();

        for &name in role.profile_fields() {
            match fields.remove(name) {
                Some(Value::Null) | None => missing.push(name.to_string()),
                Some(Value::String(s)) if s.trim().is_empty() => missing.push(name.to_string()),
                Some(value) => {
                    profile.insert(name.to_string(), value);
                }
            }
        }

        if missing.is_empty() {
            Ok(profile)
        } else {
            Err(AuthError::MissingFields(missing))
        }
    }

    /// Unknown username and wrong password fail identically.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AuthError> {
        let mut missing = Vec::new();
        let username = required("username", req.username, &mut missing);
        let password = required("password", req.password, &mut missing);
        if !missing.is_empty() {
            return Err(AuthError::MissingFields(missing));
        }

        let user = match self.users.get_user_by_username(&username).await? {
            Some(user) => user,
            None => {
                let _ = self.hasher.verify(&password, &self.dummy_hash).await;
                warn!("Failed login attempt: {}", username);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(&password, &user.password_hash).await? {
            warn!("Failed login attempt: {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let (token, claims) = self.tokens.encode(&user.username, user.role)?;

        info!("Login successful: {} ({})", user.username, user.role);

        Ok(LoginResponse {
            token,
            expires_in: self.tokens.ttl().num_seconds(),
            username: claims.username,
            role: claims.role,
        })
    }

    /// Revoke a token that is still genuine. Revoking twice is fine.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AuthError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::MissingToken)?;
        let claims = self.tokens.decode(token)?;

        self.revocations.revoke(token, claims.exp).await?;

        info!("Logged out: {}", claims.username);
        Ok(())
    }

    /// Signature, expiry, then revocation.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Identity, AuthError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.decode(token).map_err(|e| {
            debug!("Token rejected: {}", e);
            AuthError::from(e)
        })?;

        if self.revocations.is_revoked(token).await? {
            debug!("Token rejected: revoked (user {})", claims.username);
            return Err(AuthError::Revoked);
        }

        Ok(Identity::from(claims))
    }

    /// Create `username` as an admin unless an admin already exists.
    /// Returns whether one was created.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        if self.users.has_admin().await? {
            return Ok(false);
        }

        let password_hash = self.hasher.hash(password).await?;
        self.users
            .create_user(username, password_hash, UserRole::Admin, None)
            .await?;

        info!("Bootstrap admin user created: {}", username);
        Ok(true)
    }
}

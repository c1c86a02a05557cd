//! Authentication Module
//! Mission: Password credentials, signed expiring tokens, logout revocation and role gating

pub mod api;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod revocation;
pub mod service;
pub mod user_store;

pub use error::AuthError;
pub use jwt::JwtHandler;
pub use middleware::{auth_middleware, RequireAdmin, RequireStudent};
pub use models::{Identity, UserRole};
pub use password::PasswordHasher;
pub use revocation::{MemoryRevocationRegistry, RevocationRegistry, SqliteRevocationRegistry};
pub use service::{authorize, AuthService};
pub use user_store::UserStore;

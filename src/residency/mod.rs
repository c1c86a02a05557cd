//! Residency Module
//! Mission: Residencies, their blocks and rooms, and student applications and reviews

pub mod api;
pub mod models;
pub mod repository;

pub use models::ApplicationStatus;
pub use repository::ResidencyRepository;

//! Users Domain
//!
//! Registration, login, profile management, and user administration.
//! Passwords are hashed with argon2 under a letters-digits-length policy;
//! username and email uniqueness is pre-checked in the service and enforced
//! by the store's unique constraints.

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{
    AdminUpdateUser, AuthResponse, LoginRequest, RegisterRequest, UpdateProfile, User,
    UserResponse,
};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;

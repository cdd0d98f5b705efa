//! Core library for parkspot.
//!
//! Provides the shared `ApiClient` for the parking reservation service,
//! session credential storage, and the service's data models.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, AuthFailureHandler, LogoutOnUnauthorized};
pub use auth::{CredentialStore, FileStore, KeyValueStore, KeyringStore, MemoryStore, StorageError};
pub use config::ClientConfig;

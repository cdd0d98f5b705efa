//! Session credential storage.
//!
//! This module provides:
//! - `CredentialStore`: set/get/clear of the single bearer credential
//! - `KeyValueStore`: the persistent backend it sits on, with
//!   in-memory, JSON file, and OS keychain implementations
//!
//! Presence of a non-empty credential is the only "logged in" signal.
//! Credentials never expire on the client side.

pub mod credentials;
pub mod error;
pub mod store;

pub use credentials::CredentialStore;
pub use error::StorageError;
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore};

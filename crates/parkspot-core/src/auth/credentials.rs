use std::sync::Arc;

use tracing::warn;

use super::error::Result;
use super::store::{KeyValueStore, MemoryStore};

/// Key under which the bearer credential is stored.
pub const TOKEN_KEY: &str = "rp_token";

/// Accessors for the single session credential.
/// Clone is cheap - the backend is shared.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_shared(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Credential store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Store the credential, replacing any previous one
    pub fn set(&self, token: &str) -> Result<()> {
        self.backend.set(TOKEN_KEY, token)
    }

    /// Get the stored credential, if any.
    ///
    /// A backend that cannot be read is treated the same as an empty one.
    pub fn get(&self) -> Option<String> {
        match self.backend.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                None
            }
        }
    }

    /// Remove the stored credential. Clearing an absent credential is not an error.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove(TOKEN_KEY)
    }

    pub fn is_logged_in(&self) -> bool {
        self.get().is_some_and(|token| !token.is_empty())
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

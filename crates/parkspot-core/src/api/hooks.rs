//! Policies the client runs when the server rejects the session.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::CredentialStore;

/// Reaction to a 401 response. Runs once per rejected exchange, before the
/// error is returned to the caller.
pub trait AuthFailureHandler: Send + Sync {
    fn on_unauthorized(&self);
}

impl<F> AuthFailureHandler for F
where
    F: Fn() + Send + Sync,
{
    fn on_unauthorized(&self) {
        self()
    }
}

type ReloadFn = Arc<dyn Fn() + Send + Sync>;

/// Drops the stored credential and restarts the application from its
/// logged-out state.
#[derive(Clone)]
pub struct LogoutOnUnauthorized {
    credentials: CredentialStore,
    reload: Option<ReloadFn>,
}

impl LogoutOnUnauthorized {
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            credentials,
            reload: None,
        }
    }

    /// Action that returns the user to the unauthenticated view.
    /// Without one, only the credential is cleared.
    pub fn with_reload(mut self, reload: impl Fn() + Send + Sync + 'static) -> Self {
        self.reload = Some(Arc::new(reload));
        self
    }
}

impl AuthFailureHandler for LogoutOnUnauthorized {
    fn on_unauthorized(&self) {
        info!("Session rejected by server, logging out");
        // Best effort: the 401 is reported either way
        if let Err(e) = self.credentials.clear() {
            debug!(error = %e, "Failed to clear credential after 401");
        }
        if let Some(reload) = &self.reload {
            reload();
        }
    }
}

impl fmt::Debug for LogoutOnUnauthorized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoutOnUnauthorized")
            .field("reload", &self.reload.is_some())
            .finish()
    }
}

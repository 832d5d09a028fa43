//! Session-scoped credential holder
//!
//! Lives only as long as the caller's session; nothing is written to disk.

use crate::error::AnalysisError;
use anviksha_core::Credential;
use tracing::warn;

#[derive(Debug, Default)]
pub struct CredentialStore {
    current: Option<Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a credential; a blank one clears the store
    pub fn set(&mut self, credential: impl Into<Credential>) {
        let credential = credential.into();
        self.current = (!credential.is_blank()).then_some(credential);
    }

    pub fn current(&self) -> Option<&Credential> {
        self.current.as_ref()
    }

    /// Forget the credential ("change key")
    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }

    /// Clear the credential when `error` says it was rejected.
    ///
    /// Returns `true` when a stored credential was discarded.
    pub fn invalidate_if_auth_failure(&mut self, error: &AnalysisError) -> bool {
        if !error.requires_reauthentication() {
            return false;
        }
        let had_credential = self.current.take().is_some();
        if had_credential {
            warn!("Discarding stored API key after authentication failure");
        }
        had_credential
    }
}

//! Credential storage for the remote API
//!
//! A single opaque bearer token is persisted across restarts in the
//! operating system keyring. Absence of the token routes send attempts
//! to a credential-entry prompt instead of the network.

use crate::error::Result;

const DEFAULT_SERVICE: &str = "docuchat";
const DEFAULT_USER: &str = "api_credential";

/// Persistent store for the single API credential
#[derive(Debug, Clone)]
pub struct CredentialStore {
    service: String,
    user: String,
}

impl CredentialStore {
    /// Create a store backed by the default keyring entry
    pub fn new() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            user: DEFAULT_USER.to_string(),
        }
    }

    /// Create a store backed by a custom keyring entry
    ///
    /// Useful for tests and for running multiple isolated profiles.
    pub fn with_entry(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    /// Load the stored credential, if any
    ///
    /// A missing entry or an empty password both read as "no credential".
    pub fn load(&self) -> Option<String> {
        let entry = match keyring::Entry::new(&self.service, &self.user) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Keyring not available while loading credential: {}", e);
                return None;
            }
        };

        match entry.get_password() {
            Ok(token) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::warn!("Failed to read credential from keyring: {}", e);
                None
            }
        }
    }

    /// Store a new credential, replacing any existing one
    pub fn store(&self, token: &str) -> Result<()> {
        let entry = keyring::Entry::new(&self.service, &self.user)?;
        entry.set_password(token)?;
        Ok(())
    }

    /// Clear the stored credential (best-effort)
    ///
    /// When an authentication failure invalidates the credential, the
    /// orchestrator clears it so the next send routes back to the
    /// credential-entry prompt. This sets an empty password as a safe,
    /// widely-available invalidation step rather than relying on a delete
    /// API that may vary between environments.
    pub fn clear(&self) {
        match keyring::Entry::new(&self.service, &self.user) {
            Ok(entry) => {
                if let Err(e) = entry.set_password("") {
                    tracing::warn!("Failed to clear stored credential: {}", e);
                } else {
                    tracing::info!("Cleared stored credential in keyring");
                }
            }
            Err(e) => {
                tracing::warn!("Keyring not available while clearing credential: {}", e);
            }
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

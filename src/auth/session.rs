use chrono::Duration;
use tracing::warn;

use super::error::AuthError;
use super::store::CredentialStore;

/// Local, network-free check of whether the stored session is usable.
#[derive(Clone)]
pub struct SessionOracle {
    store: CredentialStore,
}

impl SessionOracle {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    pub fn is_authenticated(&self) -> bool {
        self.check().is_ok()
    }

    /// Like [`is_authenticated`](Self::is_authenticated), reporting why not.
    ///
    /// An expired session is cleared from the store as a side effect.
    pub fn check(&self) -> Result<(), AuthError> {
        if self.store.access_token().is_none() {
            return Err(AuthError::NoCredential);
        }
        if let Some(expires_at) = self.store.expires_at() {
            if self.store.now_millis() >= expires_at {
                warn!(expires_at, "Access token expired");
                self.store.clear();
                return Err(AuthError::Expired);
            }
        }
        Ok(())
    }

    /// Time left before the stored expiry; negative once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        let expires_at = self.store.expires_at()?;
        Some(Duration::milliseconds(expires_at - self.store.now_millis()))
    }
}

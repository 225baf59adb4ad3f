//! Credential persistence over a [`ScopedStorage`].

use std::sync::Arc;

use tracing::{debug, warn};

use super::credentials::{CredentialBundle, TokenGrant, UserProfile};
use super::error::AuthError;
use super::storage::{Scope, ScopedStorage};
use crate::util::{Clock, SystemClock};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user_data";
pub const EXPIRES_KEY: &str = "token_expires";

/// Every key the store ever writes.
pub const CREDENTIAL_KEYS: [&str; 4] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY, EXPIRES_KEY];

/// Reads and writes the logged-in user's credentials.
///
/// Writes go to one scope; reads consult the persistent scope first and fall
/// back to the session scope, so bundles left behind by earlier sessions in
/// either scope are still found.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use ecodash::auth::{CredentialStore, MemoryStorage, Scope, TokenGrant};
///
/// let store = CredentialStore::new(Arc::new(MemoryStorage::new()));
/// let grant = TokenGrant {
///     access_token: Some("access".to_string()),
///     refresh_token: Some("refresh".to_string()),
///     expires_in: Some(3600),
///     user: None,
/// };
/// store.save(&grant, Scope::Session)?;
/// assert_eq!(store.access_token().as_deref(), Some("access"));
/// store.clear();
/// assert!(store.access_token().is_none());
/// # Ok::<(), ecodash::auth::AuthError>(())
/// ```
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn ScopedStorage>,
    clock: Arc<dyn Clock>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn ScopedStorage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: Arc<dyn ScopedStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Write every field present in `grant` into `scope`.
    ///
    /// Absent fields leave whatever is already stored untouched. The expiry is
    /// computed here from `expires_in` and never recomputed elsewhere.
    pub fn save(&self, grant: &TokenGrant, scope: Scope) -> Result<(), AuthError> {
        if let Some(access) = grant.access_token.as_deref().filter(|t| !t.is_empty()) {
            self.storage.set(scope, ACCESS_TOKEN_KEY, access)?;
        }
        if let Some(refresh) = grant.refresh_token.as_deref().filter(|t| !t.is_empty()) {
            self.storage.set(scope, REFRESH_TOKEN_KEY, refresh)?;
        }
        if let Some(user) = &grant.user {
            let serialized = serde_json::to_string(user)?;
            self.storage.set(scope, USER_KEY, &serialized)?;
        }
        // A zero lifetime means the server sent no usable expiry.
        if let Some(expires_in) = grant.expires_in.filter(|secs| *secs > 0) {
            let lifetime_ms = i64::try_from(expires_in.saturating_mul(1000)).unwrap_or(i64::MAX);
            let expires_at = self.clock.now_millis().saturating_add(lifetime_ms);
            self.storage
                .set(scope, EXPIRES_KEY, &expires_at.to_string())?;
        }
        debug!(%scope, "Saved credentials");
        Ok(())
    }

    /// Remove every credential key from both scopes. Never fails.
    pub fn clear(&self) {
        for scope in Scope::READ_ORDER {
            for key in CREDENTIAL_KEYS {
                if let Err(err) = self.storage.remove(scope, key) {
                    warn!(%scope, key, error = %err, "Failed to remove credential");
                }
            }
        }
        debug!("Cleared credentials");
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Cached user profile; malformed JSON reads as absent.
    pub fn user(&self) -> Option<UserProfile> {
        let raw = self.read(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(error = %err, "Stored user profile is malformed");
                None
            }
        }
    }

    /// Absolute expiry in epoch milliseconds, if one was stored.
    pub fn expires_at(&self) -> Option<i64> {
        let raw = self.read(EXPIRES_KEY)?;
        match raw.trim().parse::<i64>() {
            Ok(at) => Some(at),
            Err(_) => {
                warn!(value = %raw, "Stored token expiry is malformed");
                None
            }
        }
    }

    /// Current credentials, or `None` when no access token is stored.
    pub fn bundle(&self) -> Option<CredentialBundle> {
        Some(CredentialBundle {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token(),
            user: self.user(),
            expires_at: self.expires_at(),
        })
    }

    /// Whether the persistent scope holds an access token.
    pub fn holds_persistent(&self) -> bool {
        self.read_scope(Scope::Persistent, ACCESS_TOKEN_KEY).is_some()
    }

    fn read(&self, key: &str) -> Option<String> {
        Scope::READ_ORDER
            .into_iter()
            .find_map(|scope| self.read_scope(scope, key))
    }

    fn read_scope(&self, scope: Scope, key: &str) -> Option<String> {
        match self.storage.get(scope, key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                warn!(%scope, key, error = %err, "Failed to read credential");
                None
            }
        }
    }
}

//! Access-token renewal with a single-flight guard.

use reqwest::header::CONTENT_TYPE;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::credentials::{CredentialBundle, TokenGrant};
use super::error::AuthError;
use super::storage::Scope;
use super::store::CredentialStore;

/// Which scope renewed credentials are written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshScopePolicy {
    /// Always the persistent scope, even for session-only logins.
    #[default]
    AlwaysPersistent,
    /// The scope currently holding the access token.
    PreserveLoginScope,
}

/// Exchanges the stored refresh token for a new credential bundle.
///
/// Refreshes are serialized: while one is in flight, others wait for it and
/// reuse its outcome instead of sending a second refresh request.
pub struct RefreshCoordinator {
    client: reqwest::Client,
    refresh_url: String,
    store: CredentialStore,
    policy: RefreshScopePolicy,
    in_flight: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(client: reqwest::Client, refresh_url: impl Into<String>, store: CredentialStore) -> Self {
        Self {
            client,
            refresh_url: refresh_url.into(),
            store,
            policy: RefreshScopePolicy::default(),
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_policy(mut self, policy: RefreshScopePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Unconditionally renew the credentials.
    ///
    /// On any failure the store is cleared before the error is returned.
    pub async fn refresh(&self) -> Result<CredentialBundle, AuthError> {
        let _singleflight = self.in_flight.lock().await;
        self.exchange().await
    }

    /// Renew the credentials unless `stale_access_token` was already replaced.
    ///
    /// `stale_access_token` is the token a rejected request carried. If the
    /// store holds a different token by the time the guard is acquired, a
    /// concurrent caller already refreshed and the stored bundle is returned
    /// without a network call.
    pub async fn refresh_if_stale(
        &self,
        stale_access_token: Option<&str>,
    ) -> Result<CredentialBundle, AuthError> {
        let _singleflight = self.in_flight.lock().await;
        if let (Some(stale), Some(current)) = (stale_access_token, self.store.bundle()) {
            if current.access_token != stale {
                debug!("Access token already renewed by a concurrent refresh");
                return Ok(current);
            }
        }
        self.exchange().await
    }

    async fn exchange(&self) -> Result<CredentialBundle, AuthError> {
        match self.try_exchange().await {
            Ok(bundle) => {
                info!("Access token refreshed");
                Ok(bundle)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed, clearing session");
                self.store.clear();
                Err(err)
            }
        }
    }

    async fn try_exchange(&self) -> Result<CredentialBundle, AuthError> {
        let refresh_token = self.store.refresh_token().ok_or(AuthError::NoRefreshToken)?;
        let scope = match self.policy {
            RefreshScopePolicy::AlwaysPersistent => Scope::Persistent,
            RefreshScopePolicy::PreserveLoginScope if self.store.holds_persistent() => {
                Scope::Persistent
            }
            RefreshScopePolicy::PreserveLoginScope => Scope::Session,
        };

        let resp = self
            .client
            .post(&self.refresh_url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&refresh_token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::RefreshRejected(resp.status().as_u16()));
        }
        let grant: TokenGrant = resp.json().await?;
        if !grant.has_access_token() {
            return Err(AuthError::InvalidResponse(
                "Refresh response missing access_token".to_string(),
            ));
        }
        self.store.save(&grant, scope)?;
        self.store.bundle().ok_or_else(|| {
            AuthError::InvalidResponse("Refreshed credentials could not be read back".to_string())
        })
    }
}

//! Route protection for pages that require a logged-in admin.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::credentials::UserProfile;
use super::redirect::{GuardState, Navigator, RedirectReason, Redirector, TracingNavigator};
use super::refresh::RefreshCoordinator;
use super::service::{AuthService, LogoutOutcome};
use super::session::SessionOracle;
use super::storage::{FileStorage, ScopedStorage};
use super::store::CredentialStore;
use crate::config::ClientConfig;
use crate::error::EcodashError;
use crate::gateway::Gateway;
use crate::util::{Clock, SystemClock};

/// Guards one page lifecycle.
///
/// [`protect`](Self::protect) checks the stored session once; if it is valid
/// the guard hands out the authenticated [`Gateway`] and re-checks the session
/// every [`ClientConfig::revalidate_every`] until logout, shutdown, or drop.
/// Any failure ends in [`GuardState::Redirecting`].
///
/// # Example
/// ```no_run
/// use ecodash::auth::RouteGuard;
/// use ecodash::config::ClientConfig;
///
/// # async fn example() -> ecodash::error::Result<()> {
/// let guard = RouteGuard::builder(ClientConfig::from_env()).build()?;
/// let Some(gateway) = guard.protect() else {
///     return Ok(()); // host is navigating to login
/// };
/// if guard.has_any_role(&["admin", "manager"]) {
///     let _resp = gateway.get("http://localhost:8000/api/v1/admin/dashboard").await?;
/// }
/// guard.logout().await;
/// # Ok(())
/// # }
/// ```
pub struct RouteGuard {
    revalidate_every: std::time::Duration,
    store: CredentialStore,
    oracle: SessionOracle,
    service: AuthService,
    redirector: Arc<Redirector>,
    gateway: Gateway,
    monitor: Mutex<Option<CancellationToken>>,
}

/// Builder for [`RouteGuard`]; every collaborator has a default.
pub struct RouteGuardBuilder {
    config: ClientConfig,
    storage: Option<Arc<dyn ScopedStorage>>,
    navigator: Option<Arc<dyn Navigator>>,
    clock: Option<Arc<dyn Clock>>,
    client: Option<reqwest::Client>,
}

impl RouteGuardBuilder {
    /// Defaults to [`FileStorage`] under [`ClientConfig::storage_dir`].
    pub fn storage(mut self, storage: Arc<dyn ScopedStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Defaults to [`TracingNavigator`].
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<RouteGuard, EcodashError> {
        let config = self.config;
        let client = match self.client {
            Some(client) => client,
            None => config.http_client()?,
        };
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(FileStorage::new(config.storage_dir.clone())));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(TracingNavigator));

        let store = CredentialStore::with_clock(storage, clock);
        let refresher = Arc::new(
            RefreshCoordinator::new(
                client.clone(),
                config.url(&config.endpoints.refresh),
                store.clone(),
            )
            .with_policy(config.refresh_scope),
        );
        let redirector = Arc::new(Redirector::new(
            store.clone(),
            navigator,
            config.login_url.clone(),
        ));
        let gateway = Gateway::authenticated(
            &config.api_base_url,
            client.clone(),
            store.clone(),
            refresher,
            redirector.clone(),
        );

        Ok(RouteGuard {
            revalidate_every: config.revalidate_every,
            oracle: SessionOracle::new(store.clone()),
            service: AuthService::new(&config, client, store.clone()),
            store,
            redirector,
            gateway,
            monitor: Mutex::new(None),
        })
    }
}

impl RouteGuard {
    pub fn builder(config: ClientConfig) -> RouteGuardBuilder {
        RouteGuardBuilder {
            config,
            storage: None,
            navigator: None,
            clock: None,
            client: None,
        }
    }

    pub fn state(&self) -> GuardState {
        self.redirector.state()
    }

    /// Subscribe to state transitions.
    pub fn watch_state(&self) -> watch::Receiver<GuardState> {
        self.redirector.subscribe()
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn auth_service(&self) -> &AuthService {
        &self.service
    }

    /// Check the session, redirecting to login if it is not valid.
    pub fn check_auth(&self) -> bool {
        match self.oracle.check() {
            Ok(()) => true,
            Err(err) => {
                info!(reason = %err, "Not authenticated");
                self.redirector.redirect(RedirectReason::NotAuthenticated);
                false
            }
        }
    }

    /// Run the page-load check.
    ///
    /// Returns the authenticated gateway when the page may proceed, `None`
    /// when the host is being redirected. Calling it again while protected
    /// returns the same gateway without starting a second monitor.
    pub fn protect(&self) -> Option<Gateway> {
        match self.state() {
            GuardState::Protected => return Some(self.gateway.clone()),
            GuardState::Redirecting => return None,
            GuardState::Unchecked => {}
        }
        if !self.check_auth() {
            return None;
        }
        if self.redirector.mark_protected() {
            info!("Session valid, page protected");
            self.start_monitor();
        }
        (self.state() == GuardState::Protected).then(|| self.gateway.clone())
    }

    /// Stop re-validation without touching the session.
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.monitor.lock() {
            if let Some(token) = slot.take() {
                token.cancel();
                debug!("Session monitor stopped");
            }
        }
    }

    /// Best-effort server logout, local clear, then redirect.
    pub async fn logout(&self) -> LogoutOutcome {
        self.shutdown();
        let outcome = self.service.logout().await;
        self.redirector.redirect(RedirectReason::LoggedOut);
        outcome
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.store.user()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.current_user().is_some_and(|user| user.has_role(role))
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.current_user()
            .is_some_and(|user| user.has_any_role(roles))
    }

    /// Run `action` only if the user holds one of `roles`.
    pub fn protect_action<T>(&self, roles: &[&str], action: impl FnOnce() -> T) -> Option<T> {
        if self.has_any_role(roles) {
            Some(action())
        } else {
            warn!(?roles, "Action denied, required role missing");
            None
        }
    }

    /// Run `action` if the user holds one of `roles`, otherwise `on_denied`.
    pub fn protect_action_or<T>(
        &self,
        roles: &[&str],
        action: impl FnOnce() -> T,
        on_denied: impl FnOnce() -> T,
    ) -> T {
        self.protect_action(roles, action).unwrap_or_else(on_denied)
    }

    fn start_monitor(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No Tokio runtime, session re-validation disabled");
            return;
        };
        let Ok(mut slot) = self.monitor.lock() else {
            return;
        };
        if slot.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let oracle = self.oracle.clone();
        let redirector = self.redirector.clone();
        let every = self.revalidate_every;

        handle.spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately; protect() just checked.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        if redirector.state() == GuardState::Redirecting {
                            break;
                        }
                        if let Err(err) = oracle.check() {
                            warn!(reason = %err, "Session invalid during re-validation");
                            redirector.session_expired();
                            break;
                        }
                        debug!("Session still valid");
                    }
                }
            }
        });
        *slot = Some(token);
    }
}

impl Drop for RouteGuard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

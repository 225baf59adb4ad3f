//! Route-guard state and the hand-off to the host's login surface.

use tokio::sync::watch;
use tracing::info;

use super::store::CredentialStore;

/// Lifecycle of a protected page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum GuardState {
    /// Session not yet checked.
    Unchecked,
    /// Session valid; the gateway is installed and re-validation is running.
    Protected,
    /// The host has been told to navigate to the login surface. Terminal.
    Redirecting,
}

/// Why the host is being sent to the login surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RedirectReason {
    NotAuthenticated,
    SessionExpired,
    LoggedOut,
}

/// Host-side navigation to the login surface.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self, login_url: &str, reason: RedirectReason);
}

/// Navigator that only records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect_to_login(&self, login_url: &str, reason: RedirectReason) {
        info!(login_url, %reason, "Redirecting to login");
    }
}

/// Owns the transition into [`GuardState::Redirecting`].
///
/// Shared by the route guard and the gateway so that a session ending on
/// either path produces exactly one navigation.
pub struct Redirector {
    store: CredentialStore,
    navigator: std::sync::Arc<dyn Navigator>,
    login_url: String,
    state: watch::Sender<GuardState>,
}

impl Redirector {
    pub fn new(
        store: CredentialStore,
        navigator: std::sync::Arc<dyn Navigator>,
        login_url: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(GuardState::Unchecked);
        Self {
            store,
            navigator,
            login_url: login_url.into(),
            state,
        }
    }

    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    /// `Unchecked` → `Protected`. Returns false if the page already left `Unchecked`.
    pub(crate) fn mark_protected(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == GuardState::Unchecked {
                *state = GuardState::Protected;
                true
            } else {
                false
            }
        })
    }

    /// Enter `Redirecting` and navigate, once.
    pub fn redirect(&self, reason: RedirectReason) {
        let entered = self.state.send_if_modified(|state| {
            if *state == GuardState::Redirecting {
                false
            } else {
                *state = GuardState::Redirecting;
                true
            }
        });
        if entered {
            self.navigator.redirect_to_login(&self.login_url, reason);
        }
    }

    /// Clear credentials, then redirect.
    pub fn session_expired(&self) {
        self.store.clear();
        self.redirect(RedirectReason::SessionExpired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::auth::storage::MemoryStorage;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<RedirectReason>>);

    impl Navigator for Recorder {
        fn redirect_to_login(&self, _login_url: &str, reason: RedirectReason) {
            self.0.lock().unwrap().push(reason);
        }
    }

    fn redirector() -> (Arc<Recorder>, Redirector) {
        let recorder = Arc::new(Recorder::default());
        let store = CredentialStore::new(Arc::new(MemoryStorage::new()));
        (recorder.clone(), Redirector::new(store, recorder, "/index.html"))
    }

    #[test]
    fn redirect_navigates_once() {
        let (recorder, redirector) = redirector();
        redirector.session_expired();
        redirector.redirect(RedirectReason::LoggedOut);
        assert_eq!(*recorder.0.lock().unwrap(), vec![RedirectReason::SessionExpired]);
        assert_eq!(redirector.state(), GuardState::Redirecting);
    }

    #[test]
    fn protected_only_from_unchecked() {
        let (_recorder, redirector) = redirector();
        assert!(redirector.mark_protected());
        assert!(!redirector.mark_protected());
        redirector.redirect(RedirectReason::NotAuthenticated);
        assert!(!redirector.mark_protected());
        assert_eq!(redirector.state(), GuardState::Redirecting);
    }
}

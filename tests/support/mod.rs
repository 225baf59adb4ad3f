#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ecodash::auth::{
    CredentialStore, MemoryStorage, Navigator, RedirectReason, RouteGuard, Scope, TokenGrant,
};
use ecodash::config::ClientConfig;
use ecodash::util::ManualClock;
use serde_json::{json, Value};

/// Navigator that remembers every redirect it was asked to perform.
#[derive(Default)]
pub struct RecordingNavigator {
    calls: Mutex<Vec<(String, RedirectReason)>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, RedirectReason)> {
        self.calls.lock().expect("navigator lock poisoned").clone()
    }

    pub fn reasons(&self) -> Vec<RedirectReason> {
        self.calls().into_iter().map(|(_, reason)| reason).collect()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self, login_url: &str, reason: RedirectReason) {
        self.calls
            .lock()
            .expect("navigator lock poisoned")
            .push((login_url.to_string(), reason));
    }
}

/// Everything a test needs to drive a guard against a mock backend.
pub struct Harness {
    pub config: ClientConfig,
    pub storage: Arc<MemoryStorage>,
    pub clock: Arc<ManualClock>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(base_url: &str) -> Self {
        Self {
            config: ClientConfig::new(base_url),
            storage: Arc::new(MemoryStorage::new()),
            clock: Arc::new(ManualClock::new(1_700_000_000_000)),
            navigator: Arc::new(RecordingNavigator::new()),
        }
    }

    pub fn store(&self) -> CredentialStore {
        CredentialStore::with_clock(self.storage.clone(), self.clock.clone())
    }

    pub fn guard(&self) -> RouteGuard {
        RouteGuard::builder(self.config.clone())
            .storage(self.storage.clone())
            .clock(self.clock.clone())
            .navigator(self.navigator.clone())
            .client(reqwest::Client::new())
            .build()
            .expect("build guard")
    }

    /// Store a session as if a login had succeeded.
    pub fn seed(&self, access: &str, refresh: Option<&str>, expires_in: Option<u64>, scope: Scope) {
        let grant = TokenGrant {
            access_token: Some(access.to_string()),
            refresh_token: refresh.map(ToString::to_string),
            expires_in,
            user: Some(admin_user()),
        };
        self.store().save(&grant, scope).expect("seed credentials");
    }
}

pub fn admin_user() -> Value {
    json!({"id": 1, "email": "admin@eco.org", "name": "Admin", "role": "admin"})
}

pub fn grant_json(access: &str, refresh: &str, expires_in: u64) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
        "expires_in": expires_in,
        "user": admin_user(),
    })
}

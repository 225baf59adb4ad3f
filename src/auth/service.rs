use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::credentials::{TokenGrant, UserProfile};
use super::error::AuthError;
use super::session::SessionOracle;
use super::storage::Scope;
use super::store::CredentialStore;
use crate::config::ClientConfig;

const MIN_PASSWORD_LEN: usize = 3;
const DEFAULT_LOGIN_FAILURE: &str = "Login failed";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email validation regex must compile")
});

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub grant: TokenGrant,
    pub user: Option<UserProfile>,
    /// Scope the credentials were written to.
    pub scope: Scope,
}

/// Result of a logout. Local credentials are always cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutOutcome {
    /// Whether the backend acknowledged the logout call.
    pub server_acknowledged: bool,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    detail: Option<serde_json::Value>,
}

/// Check login form input before contacting the backend.
///
/// The email is trimmed before matching; the password is taken verbatim.
pub fn validate_login(email: &str, password: &str) -> Result<(), AuthError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthError::Validation("Email is required.".to_string()));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AuthError::Validation("Enter a valid email.".to_string()));
    }
    if password.is_empty() {
        return Err(AuthError::Validation("Password is required.".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

/// Login and logout against the backend's auth endpoints.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use ecodash::auth::{AuthService, CredentialStore, MemoryStorage};
/// use ecodash::config::ClientConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::default();
/// let store = CredentialStore::new(Arc::new(MemoryStorage::new()));
/// let auth = AuthService::new(&config, config.http_client()?, store);
/// let outcome = auth.login("admin@eco.org", "secret", true).await?;
/// println!("logged in as {:?}", outcome.user.and_then(|u| u.email));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthService {
    client: reqwest::Client,
    login_url: String,
    logout_url: String,
    store: CredentialStore,
}

impl AuthService {
    pub fn new(config: &ClientConfig, client: reqwest::Client, store: CredentialStore) -> Self {
        Self {
            client,
            login_url: config.url(&config.endpoints.login),
            logout_url: config.url(&config.endpoints.logout),
            store,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn is_authenticated(&self) -> bool {
        SessionOracle::new(self.store.clone()).is_authenticated()
    }

    /// Authenticate and store the returned credentials.
    ///
    /// `remember_me` selects the persistent scope; otherwise the credentials
    /// only live for the current session.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<LoginOutcome, AuthError> {
        validate_login(email, password)?;
        info!("Starting login");

        let resp = self
            .client
            .post(&self.login_url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&LoginRequest {
                email: email.trim(),
                password,
            })
            .send()
            .await
            .map_err(|err| AuthError::Unreachable(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = rejection_message(&body);
            warn!(status = status.as_u16(), %message, "Login rejected");
            return Err(AuthError::LoginRejected(message));
        }

        let grant: TokenGrant = resp.json().await?;
        if !grant.has_access_token() {
            return Err(AuthError::InvalidResponse(
                "Login response missing access_token".to_string(),
            ));
        }
        let scope = Scope::for_remember_me(remember_me);
        self.store.save(&grant, scope)?;
        info!(%scope, "Login succeeded");

        Ok(LoginOutcome {
            user: self.store.user(),
            grant,
            scope,
        })
    }

    /// Best-effort server logout followed by an unconditional local clear.
    pub async fn logout(&self) -> LogoutOutcome {
        let mut server_acknowledged = false;
        if let Some(access_token) = self.store.access_token() {
            match self
                .client
                .post(&self.logout_url)
                .header(CONTENT_TYPE, "application/json")
                .bearer_auth(access_token)
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => server_acknowledged = true,
                Ok(resp) => {
                    warn!(status = resp.status().as_u16(), "Server logout rejected");
                }
                Err(err) => warn!(error = %err, "Server logout failed"),
            }
        }
        self.store.clear();
        info!(server_acknowledged, "Logged out");
        LogoutOutcome {
            server_acknowledged,
        }
    }
}

fn rejection_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return DEFAULT_LOGIN_FAILURE.to_string();
    };
    if let Some(message) = parsed.message.filter(|m| !m.is_empty()) {
        return message;
    }
    match parsed.detail {
        Some(serde_json::Value::String(detail)) if !detail.is_empty() => detail,
        _ => DEFAULT_LOGIN_FAILURE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_input_passes() {
        assert!(validate_login("  admin@eco.org ", "abc").is_ok());
    }

    #[test]
    fn email_is_required_and_shaped() {
        for email in ["", "   ", "admin", "admin@eco", "ad min@eco.org", "@eco.org"] {
            assert!(
                matches!(validate_login(email, "secret"), Err(AuthError::Validation(_))),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn password_needs_three_characters() {
        assert!(matches!(
            validate_login("a@eco.org", ""),
            Err(AuthError::Validation(msg)) if msg == "Password is required."
        ));
        assert!(matches!(
            validate_login("a@eco.org", "ab"),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn rejection_message_prefers_message_then_detail() {
        assert_eq!(rejection_message(r#"{"message":"Bad creds"}"#), "Bad creds");
        assert_eq!(
            rejection_message(r#"{"detail":"Incorrect email or password"}"#),
            "Incorrect email or password"
        );
        assert_eq!(rejection_message(r#"{"detail":[{"loc":["body"]}]}"#), "Login failed");
        assert_eq!(rejection_message("oops"), "Login failed");
    }
}

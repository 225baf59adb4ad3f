//! Client configuration (layered: code > env > built-in defaults).

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::RefreshScopePolicy;
use crate::error::EcodashError;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_LOGIN_URL: &str = "/index.html";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_REVALIDATE_SECS: u64 = 5 * 60;

/// Backend paths, relative to [`ClientConfig::api_base_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub logout: String,
    pub refresh: String,
    pub admin_dashboard: String,
    pub environmental_stats: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/api/v1/auth/login".to_string(),
            logout: "/api/v1/auth/logout".to_string(),
            refresh: "/api/v1/auth/refresh".to_string(),
            admin_dashboard: "/api/v1/admin/dashboard".to_string(),
            environmental_stats: "/api/v1/admin/stats/environmental".to_string(),
        }
    }
}

/// Configuration shared by the auth service, gateway, and route guard.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ecodash::config::ClientConfig;
///
/// let config = ClientConfig::new("https://api.example.org/")
///     .with_revalidate_every(Duration::from_secs(60));
/// assert_eq!(config.url("/api/v1/auth/login"), "https://api.example.org/api/v1/auth/login");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub endpoints: Endpoints,
    /// Where the host navigates when the session ends.
    pub login_url: String,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
    /// Interval of the route guard's session re-validation.
    pub revalidate_every: Duration,
    pub refresh_scope: RefreshScopePolicy,
    /// Directory holding the persistent credential scope.
    pub storage_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        let api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        Self {
            api_base_url,
            endpoints: Endpoints::default(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            revalidate_every: Duration::from_secs(DEFAULT_REVALIDATE_SECS),
            refresh_scope: RefreshScopePolicy::default(),
            storage_dir: default_storage_dir(),
        }
    }

    /// Load from environment variables, reading `.env` if present.
    ///
    /// Recognized: `ECODASH_API_BASE_URL`, `ECODASH_LOGIN_URL`,
    /// `ECODASH_TIMEOUT_MS`, `ECODASH_REVALIDATE_SECS`, `ECODASH_STORAGE_DIR`.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unparseable numbers keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match lookup("ECODASH_API_BASE_URL") {
            Some(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        };
        if let Some(login_url) = lookup("ECODASH_LOGIN_URL") {
            config.login_url = login_url;
        }
        if let Some(ms) = parse_u64(&lookup, "ECODASH_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(&lookup, "ECODASH_REVALIDATE_SECS") {
            config.revalidate_every = Duration::from_secs(secs.max(1));
        }
        if let Some(dir) = lookup("ECODASH_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_revalidate_every(mut self, every: Duration) -> Self {
        self.revalidate_every = every;
        self
    }

    pub fn with_refresh_scope(mut self, policy: RefreshScopePolicy) -> Self {
        self.refresh_scope = policy;
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Absolute URL for a backend path. Endpoints that are already absolute
    /// URLs are returned as they are.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    /// Build the HTTP client used by every component.
    pub fn http_client(&self) -> Result<reqwest::Client, EcodashError> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|err| EcodashError::Configuration(format!("HTTP client: {err}")))
    }
}

/// Prefix match on a path-segment boundary.
pub(crate) fn is_under_base(base: &str, url: &str) -> bool {
    match url.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
        None => false,
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable configuration value");
            None
        }
    }
}

fn default_storage_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".ecodash"))
        .unwrap_or_else(|| PathBuf::from(".ecodash"))
}

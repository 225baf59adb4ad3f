use thiserror::Error;

use crate::error::ErrorCategory;

/// Session-level authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NoCredential,
    #[error("No refresh token available")]
    NoRefreshToken,
    #[error("Access token expired")]
    Expired,
    #[error("Session expired, please log in again")]
    SessionExpired,
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Login rejected: {0}")]
    LoginRejected(String),
    #[error("Token refresh rejected with status {0}")]
    RefreshRejected(u16),
    #[error("Cannot reach server: {0}")]
    Unreachable(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Whether the session cannot continue and the user must log in again.
    pub fn is_session_terminal(&self) -> bool {
        matches!(
            self,
            Self::NoCredential
                | Self::NoRefreshToken
                | Self::Expired
                | Self::SessionExpired
                | Self::RefreshRejected(_)
        )
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoCredential
            | Self::NoRefreshToken
            | Self::Expired
            | Self::SessionExpired
            | Self::RefreshRejected(_) => ErrorCategory::Session,
            Self::Validation(_) | Self::LoginRejected(_) => ErrorCategory::Credentials,
            Self::Unreachable(_) | Self::Network(_) => ErrorCategory::Network,
            Self::InvalidResponse(_) => ErrorCategory::Api,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Serialization(_) => ErrorCategory::Serialization,
        }
    }

    /// Text for the login surface.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::LoginRejected(message) => {
                let lowered = message.to_ascii_lowercase();
                if lowered.contains("email") || lowered.contains("password") {
                    "Incorrect email or password.".to_string()
                } else {
                    "Could not sign in. Please try again.".to_string()
                }
            }
            Self::Unreachable(_) | Self::Network(_) => {
                "Could not connect to the server. Check your connection.".to_string()
            }
            other if other.is_session_terminal() => {
                "Your session has expired. Please log in again.".to_string()
            }
            _ => "Could not sign in. Please try again.".to_string(),
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

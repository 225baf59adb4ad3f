//! Error types for EcoDash feature calls.

pub mod category;

pub use category::{ErrorCategory, PermissionDenial};

use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for calls made through the gateway.
///
/// Session failures arrive as [`EcodashError::Auth`]; by the time feature
/// code sees one the credentials are already cleared and the login redirect
/// has been issued. Permission and transport failures are for the caller to
/// present.
#[derive(Error, Debug)]
pub enum EcodashError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Permission denied: {0}")]
    Forbidden(PermissionDenial),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EcodashError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Map a non-success status and its body to an error.
    ///
    /// A `401` reaching this point has already been through the gateway's
    /// single refresh-and-replay, so it means the session is over.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => Self::Auth(AuthError::SessionExpired),
            403 => Self::Forbidden(PermissionDenial::from_body(body)),
            _ => Self::api(status, body),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Auth(err) => err.category(),
            Self::Forbidden(_) => ErrorCategory::Permission,
            Self::Api { status, .. } => match status {
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Network(_) => ErrorCategory::Network,
            Self::Serialization(_) => ErrorCategory::Serialization,
        }
    }

    /// Whether the session is gone and the caller should stop issuing calls.
    pub fn is_session_terminal(&self) -> bool {
        matches!(self, Self::Auth(err) if err.is_session_terminal())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EcodashError>;

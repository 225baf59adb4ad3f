//! Error classification shared by feature code and the CLI.

use serde::Deserialize;

/// Broad error category for routing presentation logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Session is gone; the caller has already been redirected to login.
    Session,
    /// Login form input or credentials were rejected.
    Credentials,
    Permission,
    Network,
    Server,
    Api,
    Configuration,
    Serialization,
    Storage,
}

/// Why the backend answered `403 Forbidden`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PermissionDenial {
    #[strum(to_string = "admin access required")]
    AdminAccessRequired,
    #[strum(to_string = "insufficient permissions")]
    InsufficientPermissions,
}

/// Machine-readable code the backend may send alongside a 403.
pub const ADMIN_ACCESS_REQUIRED_CODE: &str = "admin_access_required";

/// Legacy literal message used before structured codes existed.
pub const ADMIN_ACCESS_REQUIRED_MESSAGE: &str = "Admin access required";

#[derive(Debug, Deserialize)]
struct ForbiddenBody {
    code: Option<String>,
    message: Option<String>,
    detail: Option<String>,
}

impl PermissionDenial {
    /// Classify a 403 response body.
    ///
    /// A structured `code` wins; the literal message is only consulted when no
    /// code is present. Unparseable bodies are a generic denial.
    pub fn from_body(body: &str) -> Self {
        let Ok(parsed) = serde_json::from_str::<ForbiddenBody>(body) else {
            return Self::InsufficientPermissions;
        };
        if let Some(code) = parsed.code.as_deref() {
            return if code == ADMIN_ACCESS_REQUIRED_CODE {
                Self::AdminAccessRequired
            } else {
                Self::InsufficientPermissions
            };
        }
        let message = parsed.message.or(parsed.detail);
        if message.as_deref() == Some(ADMIN_ACCESS_REQUIRED_MESSAGE) {
            Self::AdminAccessRequired
        } else {
            Self::InsufficientPermissions
        }
    }
}

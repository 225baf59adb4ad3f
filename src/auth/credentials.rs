use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token payload returned by the login and refresh endpoints.
///
/// Every field is optional on the wire; only the ones present are written to
/// the credential store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenGrant {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Raw profile record; stored verbatim as JSON.
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

impl TokenGrant {
    pub fn has_access_token(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// The credentials currently held for the logged-in user.
///
/// # Example
/// ```
/// use ecodash::auth::CredentialBundle;
///
/// let bundle = CredentialBundle {
///     access_token: "access".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     user: None,
///     expires_at: Some(1_700_000_000_000),
/// };
/// assert!(bundle.is_expired_at(1_700_000_000_000));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialBundle {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
    /// Absolute expiry in epoch milliseconds.
    pub expires_at: Option<i64>,
}

impl CredentialBundle {
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        self.expires_at.is_some_and(|exp| now_millis >= exp)
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_at.and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

/// Profile of the logged-in user as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<RoleClaim>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_ref().is_some_and(|claim| claim.contains(role))
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }
}

/// A role claim is either a single role or a list of roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    One(String),
    Many(Vec<String>),
}

impl RoleClaim {
    pub fn contains(&self, role: &str) -> bool {
        match self {
            Self::One(own) => own == role,
            Self::Many(own) => own.iter().any(|r| r == role),
        }
    }
}

impl std::fmt::Display for RoleClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One(role) => f.write_str(role),
            Self::Many(roles) => f.write_str(&roles.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(value: serde_json::Value) -> UserProfile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn single_role_claim_matches_exactly() {
        let user = profile(json!({"id": 7, "email": "m@eco.org", "role": "manager"}));
        assert!(user.has_role("manager"));
        assert!(!user.has_role("admin"));
        assert!(user.has_any_role(&["admin", "manager"]));
    }

    #[test]
    fn staff_is_not_admin_or_manager() {
        let user = profile(json!({"role": "staff"}));
        assert!(!user.has_any_role(&["admin", "manager"]));
    }

    #[test]
    fn list_role_claim_matches_any_member() {
        let user = profile(json!({"role": ["staff", "admin"]}));
        assert!(user.has_role("admin"));
        assert!(user.has_role("staff"));
        assert!(!user.has_role("manager"));
    }

    #[test]
    fn missing_role_denies_everything() {
        let user = profile(json!({"email": "x@eco.org"}));
        assert!(!user.has_role("admin"));
        assert!(!user.has_any_role(&[]));
    }

    #[test]
    fn unknown_profile_fields_are_kept() {
        let user = profile(json!({"role": "admin", "branch_id": 3}));
        assert_eq!(user.extra.get("branch_id"), Some(&json!(3)));
    }

    #[test]
    fn grant_without_access_token_is_detected() {
        let grant: TokenGrant = serde_json::from_value(json!({"refresh_token": "r"})).unwrap();
        assert!(!grant.has_access_token());
        let grant: TokenGrant = serde_json::from_value(json!({"access_token": ""})).unwrap();
        assert!(!grant.has_access_token());
    }
}

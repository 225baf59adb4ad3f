//! Convenience re-exports for common use.

pub use crate::api::dashboard::{DashboardClient, DashboardData};
pub use crate::api::environmental::{EnvironmentalStats, EnvironmentalStatsClient};
pub use crate::auth::{
    AuthError, AuthService, CredentialBundle, CredentialStore, GuardState, Navigator,
    RedirectReason, RouteGuard, Scope, ScopedStorage, SessionOracle, UserProfile,
};
pub use crate::config::ClientConfig;
pub use crate::error::{EcodashError, PermissionDenial, Result};
pub use crate::gateway::{ApiRequest, Gateway};

//! Session management: credential storage, validity checks, token refresh,
//! login/logout flows, and route protection.

pub mod credentials;
pub mod error;
pub mod guard;
pub mod redirect;
pub mod refresh;
pub mod service;
pub mod session;
pub mod storage;
pub mod store;

pub use credentials::{CredentialBundle, RoleClaim, TokenGrant, UserProfile};
pub use error::AuthError;
pub use guard::{RouteGuard, RouteGuardBuilder};
pub use redirect::{GuardState, Navigator, RedirectReason, Redirector, TracingNavigator};
pub use refresh::{RefreshCoordinator, RefreshScopePolicy};
pub use service::{validate_login, AuthService, LoginOutcome, LogoutOutcome};
pub use session::SessionOracle;
pub use storage::{FileStorage, MemoryStorage, Scope, ScopedStorage};
pub use store::CredentialStore;

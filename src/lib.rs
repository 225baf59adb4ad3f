//! EcoDash: session-managed client for the recycling admin dashboard API.
//!
//! Keeps the admin's access/refresh tokens in a scoped credential store,
//! decides whether a session is still valid, and routes every API call through
//! a [`gateway::Gateway`] that attaches credentials and transparently refreshes
//! and replays a request once when the backend answers `401`.
//!
//! # Quick Start
//!
//! ```no_run
//! use ecodash::prelude::*;
//!
//! # async fn example() -> ecodash::error::Result<()> {
//! let config = ClientConfig::from_env();
//! let guard = RouteGuard::builder(config.clone()).build()?;
//!
//! if let Some(gateway) = guard.protect() {
//!     let dashboard = DashboardClient::new(&config, gateway, guard.store().clone());
//!     let data = dashboard.fetch().await?;
//!     println!("{} waste categories", data.waste_categories.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod prelude;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;

//! Command-line front end for the admin dashboard client.

pub mod auth;
pub mod stats;

use clap::{Parser, Subcommand};

use crate::api::environmental::DEFAULT_DAYS;

/// EcoDash admin CLI
#[derive(Parser, Debug)]
#[command(name = "ecodash", version, about = "EcoDash admin dashboard client")]
pub struct Cli {
    /// Override the API base URL (otherwise ECODASH_API_BASE_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session management
    Auth(AuthArgs),
    /// Show the admin dashboard overview
    Dashboard,
    /// Show environmental impact statistics
    Environmental(EnvironmentalArgs),
}

#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in with email and password
    Login(LoginArgs),
    /// Show the stored session
    Status,
    /// Log out and clear stored credentials
    Logout,
}

/// Arguments for `ecodash auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: String,

    /// Read from ECODASH_PASSWORD when omitted
    #[arg(short, long, env = "ECODASH_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Keep the session across runs
    #[arg(short, long)]
    pub remember: bool,
}

#[derive(Parser, Debug)]
pub struct EnvironmentalArgs {
    /// Analysis window in days
    #[arg(short, long, default_value_t = DEFAULT_DAYS)]
    pub days: u32,
}

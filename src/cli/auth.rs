//! Handlers for `ecodash auth ...`.

use crate::auth::{RouteGuard, SessionOracle};
use crate::config::ClientConfig;

use super::LoginArgs;

/// Handle `ecodash auth login`.
pub async fn handle_login(
    config: ClientConfig,
    args: &LoginArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let guard = RouteGuard::builder(config).build()?;
    let outcome = guard
        .auth_service()
        .login(&args.email, &args.password, args.remember)
        .await
        .map_err(|err| err.user_message())?;

    let who = outcome
        .user
        .as_ref()
        .and_then(|user| user.name.clone().or_else(|| user.email.clone()))
        .unwrap_or_else(|| args.email.trim().to_string());
    println!("Logged in as {who} ({} session)", outcome.scope);
    Ok(())
}

/// Handle `ecodash auth status`.
pub async fn handle_status(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let guard = RouteGuard::builder(config).build()?;
    let store = guard.store();
    let oracle = SessionOracle::new(store.clone());

    if !oracle.is_authenticated() {
        println!("Not logged in");
        return Ok(());
    }

    let user = store.user();
    let email = user
        .as_ref()
        .and_then(|u| u.email.clone())
        .unwrap_or_else(|| "unknown".to_string());
    println!("Logged in as {email}");
    if let Some(role) = user.as_ref().and_then(|u| u.role.as_ref()) {
        println!("  role: {role}");
    }
    match oracle.remaining() {
        Some(left) => println!("  expires in {}m", left.num_minutes()),
        None => println!("  no expiry recorded"),
    }
    println!(
        "  storage: {}",
        if store.holds_persistent() {
            "persistent"
        } else {
            "session"
        }
    );
    Ok(())
}

/// Handle `ecodash auth logout`.
pub async fn handle_logout(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let guard = RouteGuard::builder(config).build()?;
    let outcome = guard.logout().await;
    if outcome.server_acknowledged {
        println!("Logged out");
    } else {
        println!("Logged out locally (server did not confirm)");
    }
    Ok(())
}

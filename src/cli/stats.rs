//! Handlers for the statistics commands.

use crate::api::dashboard::DashboardClient;
use crate::api::environmental::EnvironmentalStatsClient;
use crate::auth::RouteGuard;
use crate::config::ClientConfig;
use crate::error::EcodashError;

const NOT_LOGGED_IN: &str = "Not logged in. Run `ecodash auth login` first.";

fn describe(err: EcodashError) -> Box<dyn std::error::Error> {
    match err {
        EcodashError::Auth(auth) => auth.user_message().into(),
        other => other.into(),
    }
}

/// Handle `ecodash dashboard`.
pub async fn handle_dashboard(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let guard = RouteGuard::builder(config.clone()).build()?;
    let Some(gateway) = guard.protect() else {
        return Err(NOT_LOGGED_IN.into());
    };
    let client = DashboardClient::new(&config, gateway, guard.store().clone());
    let data = client.fetch().await.map_err(describe)?;

    let overview = &data.overview;
    println!("Recycled:        {:.1} kg", overview.total_waste_recycled);
    println!("CO2 reduced:     {:.1} kg", overview.carbon_footprint_reduced);
    println!("Accuracy:        {:.1}%", overview.recycling_accuracy_rate);
    println!("Events:          {}", overview.total_recycling_events);
    println!("Active users:    {}", overview.active_users);
    println!("Points awarded:  {}", overview.total_points_awarded);

    if !data.top_branches.is_empty() {
        println!("\nTop branches:");
        for branch in &data.top_branches {
            println!(
                "  {:>2}. {} ({} items)",
                branch.rank, branch.branch_name, branch.total_recycled_items
            );
        }
    }
    if !data.top_users.is_empty() {
        println!("\nTop users:");
        for user in &data.top_users {
            println!(
                "  {:>2}. {} ({} pts)",
                user.rank, user.user_name, user.total_points
            );
        }
    }
    Ok(())
}

/// Handle `ecodash environmental`.
pub async fn handle_environmental(
    config: ClientConfig,
    days: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let guard = RouteGuard::builder(config.clone()).build()?;
    let Some(gateway) = guard.protect() else {
        return Err(NOT_LOGGED_IN.into());
    };
    let client = EnvironmentalStatsClient::new(&config, gateway, guard.store().clone());
    let stats = client.fetch(days).await.map_err(describe)?;

    println!("Last {days} days");
    println!(
        "CO2 reduced:     {:.1} kg ({})",
        stats.carbon_footprint.total_reduced, stats.carbon_footprint.trend
    );
    println!("Energy saved:    {:.1} kWh", stats.energy_saved.total_kwh);
    println!("Water conserved: {:.0} L", stats.water_conserved.total_liters);
    println!("Trees equiv.:    {:.0}", stats.equivalences.trees_equivalent);
    println!(
        "Goal progress:   {:.1}% of {:.0} kg",
        stats.goals.current_progress, stats.goals.carbon_reduction_goal
    );
    Ok(())
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::read_json;
use crate::auth::{AuthError, CredentialStore};
use crate::config::ClientConfig;
use crate::error::EcodashError;
use crate::gateway::Gateway;

/// Platform-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overview {
    pub total_waste_recycled: f64,
    pub carbon_footprint_reduced: f64,
    pub recycling_accuracy_rate: f64,
    pub total_recycling_events: u64,
    pub active_users: u64,
    pub total_points_awarded: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WasteCategory {
    pub category: String,
    pub total_items: u64,
    pub total_weight: f64,
    pub carbon_reduction: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyTrend {
    pub month: String,
    pub recycling_events: u64,
    pub weight_recycled: f64,
    pub carbon_reduced: f64,
    pub accuracy_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchRanking {
    pub rank: u32,
    pub branch_id: Option<serde_json::Value>,
    pub branch_name: String,
    pub branch_city: Option<String>,
    pub total_recycled_items: u64,
    pub carbon_footprint_reduced: f64,
    pub recycling_accuracy_rate: f64,
    pub active_users_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRanking {
    pub rank: u32,
    pub user_id: Option<serde_json::Value>,
    pub user_name: String,
    pub total_points: u64,
    pub total_recycled_items: u64,
    pub carbon_footprint_reduced: f64,
    pub recycling_accuracy_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentActivity {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub user: Option<String>,
    pub points: Option<i64>,
    pub timestamp: Option<String>,
}

/// Payload of the admin dashboard endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardData {
    pub overview: Overview,
    pub waste_categories: Vec<WasteCategory>,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub top_branches: Vec<BranchRanking>,
    pub top_users: Vec<UserRanking>,
    pub recent_activities: Vec<RecentActivity>,
}

/// Fetches the admin dashboard through the authenticated gateway.
pub struct DashboardClient {
    gateway: Gateway,
    store: CredentialStore,
    url: String,
}

impl DashboardClient {
    pub fn new(config: &ClientConfig, gateway: Gateway, store: CredentialStore) -> Self {
        Self {
            gateway,
            store,
            url: config.url(&config.endpoints.admin_dashboard),
        }
    }

    /// # Errors
    ///
    /// [`AuthError::NoCredential`] without a stored token,
    /// [`EcodashError::Forbidden`] for non-admin users, and
    /// [`AuthError::SessionExpired`] when the session could not be renewed.
    pub async fn fetch(&self) -> Result<DashboardData, EcodashError> {
        if self.store.access_token().is_none() {
            return Err(AuthError::NoCredential.into());
        }
        debug!(url = %self.url, "Fetching admin dashboard");
        let response = self.gateway.get(&self.url).await?;
        read_json(response).await
    }
}

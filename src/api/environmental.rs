use serde::{Deserialize, Serialize};
use tracing::debug;

use super::read_json;
use crate::auth::{AuthError, CredentialStore};
use crate::config::ClientConfig;
use crate::error::EcodashError;
use crate::gateway::Gateway;

/// Default analysis window in days.
pub const DEFAULT_DAYS: u32 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonFootprint {
    /// kg of CO2.
    pub total_reduced: f64,
    pub daily_average: f64,
    pub percentage_improvement: f64,
    /// `improving`, `stable` or `declining`.
    pub trend: String,
    pub daily_trend: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecyclingImpact {
    pub total_weight: f64,
    pub total_items: u64,
    pub carbon_reduction: f64,
    pub energy_impact: f64,
    pub water_impact: f64,
    pub resources_impact: f64,
    pub environmental_benefit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergySaved {
    pub total_kwh: f64,
    pub equivalent_homes: f64,
    pub cost_savings: f64,
    pub daily_trend: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConserved {
    pub total_liters: f64,
    pub equivalent_days: f64,
    pub percentage_saved: f64,
    pub daily_trend: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyImpact {
    pub month: String,
    pub total_impact: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactTrends {
    pub daily: Vec<serde_json::Value>,
    pub weekly: Vec<serde_json::Value>,
    pub monthly: Vec<MonthlyImpact>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SustainabilityGoals {
    pub carbon_reduction_goal: f64,
    pub current_progress: f64,
    pub estimated_completion: Option<String>,
    pub sustainability_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equivalences {
    pub trees_equivalent: f64,
    pub cars_off_road: f64,
    pub households_powered: f64,
    pub water_bottles_saved: f64,
}

/// Payload of the environmental statistics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentalStats {
    pub carbon_footprint: CarbonFootprint,
    pub recycling_impact: RecyclingImpact,
    pub energy_saved: EnergySaved,
    pub water_conserved: WaterConserved,
    pub trends: ImpactTrends,
    pub goals: SustainabilityGoals,
    pub equivalences: Equivalences,
}

/// Fetches environmental impact statistics through the authenticated gateway.
pub struct EnvironmentalStatsClient {
    gateway: Gateway,
    store: CredentialStore,
    url: String,
}

impl EnvironmentalStatsClient {
    pub fn new(config: &ClientConfig, gateway: Gateway, store: CredentialStore) -> Self {
        Self {
            gateway,
            store,
            url: config.url(&config.endpoints.environmental_stats),
        }
    }

    /// Statistics over the last `days` days.
    pub async fn fetch(&self, days: u32) -> Result<EnvironmentalStats, EcodashError> {
        if self.store.access_token().is_none() {
            return Err(AuthError::NoCredential.into());
        }
        let url = format!("{}?days={}", self.url, days.max(1));
        debug!(%url, "Fetching environmental stats");
        let response = self.gateway.get(url).await?;
        read_json(response).await
    }
}

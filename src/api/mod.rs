//! Typed clients for the admin statistics endpoints.

pub mod dashboard;
pub mod environmental;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::EcodashError;

/// Decode a successful response, or classify a failed one.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, EcodashError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        warn!(status = status.as_u16(), "API call failed");
        return Err(EcodashError::from_status(status.as_u16(), &body));
    }
    Ok(serde_json::from_str(&body)?)
}

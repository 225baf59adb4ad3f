//! Stages that attach credentials and recover from `401 Unauthorized`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{info, warn};

use super::request::ApiRequest;
use super::stage::{RequestStage, ResponseOutcome, ResponseStage};
use crate::auth::{AuthError, CredentialStore, RefreshCoordinator, Redirector};
use crate::config::is_under_base;
use crate::error::EcodashError;

/// Adds `Authorization: Bearer <access token>` and a JSON content type to
/// calls under the API base URL. Headers the caller set are left alone.
pub struct BearerAuthStage {
    api_base_url: String,
    store: CredentialStore,
}

impl BearerAuthStage {
    pub fn new(api_base_url: impl Into<String>, store: CredentialStore) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            store,
        }
    }
}

#[async_trait]
impl RequestStage for BearerAuthStage {
    async fn prepare(&self, request: &mut ApiRequest) -> Result<(), EcodashError> {
        if !is_under_base(&self.api_base_url, &request.url) {
            return Ok(());
        }
        if !request.headers.contains_key(CONTENT_TYPE) {
            request
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if !request.headers.contains_key(AUTHORIZATION) {
            if let Some(token) = self.store.access_token() {
                if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                    request.headers.insert(AUTHORIZATION, value);
                }
            }
        }
        Ok(())
    }
}

/// On a first-attempt `401` from the API, refreshes the credentials and asks
/// for one replay. If the refresh fails the session is ended: credentials are
/// cleared, the host is redirected, and the call fails with
/// [`AuthError::SessionExpired`].
///
/// A `401` to the replay also ends the session, but the response itself is
/// handed back unchanged.
pub struct RefreshOnUnauthorized {
    api_base_url: String,
    refresher: Arc<RefreshCoordinator>,
    redirector: Arc<Redirector>,
}

impl RefreshOnUnauthorized {
    pub fn new(
        api_base_url: impl Into<String>,
        refresher: Arc<RefreshCoordinator>,
        redirector: Arc<Redirector>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            refresher,
            redirector,
        }
    }
}

#[async_trait]
impl ResponseStage for RefreshOnUnauthorized {
    async fn inspect(
        &self,
        request: &ApiRequest,
        response: reqwest::Response,
        attempt: u32,
    ) -> Result<ResponseOutcome, EcodashError> {
        if response.status() != StatusCode::UNAUTHORIZED
            || !is_under_base(&self.api_base_url, &request.url)
        {
            return Ok(ResponseOutcome::Done(response));
        }
        if attempt > 0 {
            warn!(url = %request.url, "Replay rejected with 401, ending session");
            self.redirector.session_expired();
            return Ok(ResponseOutcome::Done(response));
        }

        info!(url = %request.url, "Received 401, refreshing access token");
        match self.refresher.refresh_if_stale(request.bearer_token()).await {
            Ok(_) => Ok(ResponseOutcome::Replay(response)),
            Err(err) => {
                warn!(error = %err, "Could not renew session");
                self.redirector.session_expired();
                Err(AuthError::SessionExpired.into())
            }
        }
    }
}

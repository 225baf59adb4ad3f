//! Authenticated request gateway.
//!
//! Every call the application makes goes through a [`Gateway`]: a pipeline
//! of [`RequestStage`]s applied before sending and [`ResponseStage`]s applied
//! to the response, registered once at construction. The stock pipeline
//! built by [`Gateway::authenticated`] attaches the bearer token and performs
//! the refresh-and-replay-once recovery on `401`.

pub mod auth;
pub mod request;
pub mod stage;

pub use auth::{BearerAuthStage, RefreshOnUnauthorized};
pub use request::ApiRequest;
pub use stage::{RequestStage, ResponseOutcome, ResponseStage};

use std::sync::Arc;

use tracing::debug;

use crate::auth::{CredentialStore, RefreshCoordinator, Redirector};
use crate::error::EcodashError;

/// Replays allowed per call.
pub const MAX_REPLAYS: u32 = 1;

/// Cloneable handle to a configured request pipeline.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    client: reqwest::Client,
    request_stages: Vec<Arc<dyn RequestStage>>,
    response_stages: Vec<Arc<dyn ResponseStage>>,
}

/// Builder for a [`Gateway`] with custom stages.
pub struct GatewayBuilder {
    client: reqwest::Client,
    request_stages: Vec<Arc<dyn RequestStage>>,
    response_stages: Vec<Arc<dyn ResponseStage>>,
}

impl GatewayBuilder {
    pub fn request_stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.request_stages.push(Arc::new(stage));
        self
    }

    pub fn response_stage(mut self, stage: impl ResponseStage + 'static) -> Self {
        self.response_stages.push(Arc::new(stage));
        self
    }

    pub fn build(self) -> Gateway {
        Gateway {
            inner: Arc::new(GatewayInner {
                client: self.client,
                request_stages: self.request_stages,
                response_stages: self.response_stages,
            }),
        }
    }
}

impl Gateway {
    pub fn builder(client: reqwest::Client) -> GatewayBuilder {
        GatewayBuilder {
            client,
            request_stages: Vec::new(),
            response_stages: Vec::new(),
        }
    }

    /// The standard pipeline: bearer credentials plus refresh-on-401.
    pub fn authenticated(
        api_base_url: &str,
        client: reqwest::Client,
        store: CredentialStore,
        refresher: Arc<RefreshCoordinator>,
        redirector: Arc<Redirector>,
    ) -> Self {
        Self::builder(client)
            .request_stage(BearerAuthStage::new(api_base_url, store))
            .response_stage(RefreshOnUnauthorized::new(
                api_base_url,
                refresher,
                redirector,
            ))
            .build()
    }

    /// Send `request` through the pipeline.
    ///
    /// Non-`401` responses, including `403`, come back unchanged. A request is
    /// replayed at most [`MAX_REPLAYS`] times, whatever the stages ask for.
    pub async fn send(&self, request: ApiRequest) -> Result<reqwest::Response, EcodashError> {
        let mut attempt = 0;
        loop {
            let mut prepared = request.clone();
            for stage in &self.inner.request_stages {
                stage.prepare(&mut prepared).await?;
            }

            let response = prepared.to_reqwest(&self.inner.client).send().await?;

            let mut outcome = ResponseOutcome::Done(response);
            for stage in &self.inner.response_stages {
                outcome = match outcome {
                    ResponseOutcome::Done(response) => {
                        stage.inspect(&prepared, response, attempt).await?
                    }
                    replay => replay,
                };
            }

            match outcome {
                ResponseOutcome::Done(response) => return Ok(response),
                ResponseOutcome::Replay(response) if attempt >= MAX_REPLAYS => {
                    debug!(url = %request.url, "Replay budget spent, returning response");
                    return Ok(response);
                }
                ResponseOutcome::Replay(_) => {
                    attempt += 1;
                    debug!(url = %request.url, attempt, "Replaying request");
                }
            }
        }
    }

    pub async fn get(&self, url: impl Into<String>) -> Result<reqwest::Response, EcodashError> {
        self.send(ApiRequest::get(url)).await
    }
}

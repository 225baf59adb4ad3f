use async_trait::async_trait;

use super::request::ApiRequest;
use crate::error::EcodashError;

/// What a response stage wants done with a response.
#[derive(Debug)]
pub enum ResponseOutcome {
    /// Hand the response to the next stage, or to the caller.
    Done(reqwest::Response),
    /// Send the caller's request again. If the gateway's replay budget is
    /// spent, the carried response is returned instead.
    Replay(reqwest::Response),
}

/// Transforms a request before it is sent.
///
/// Stages run on a fresh copy of the caller's request on every attempt, so a
/// replay picks up whatever state changed in between.
#[async_trait]
pub trait RequestStage: Send + Sync {
    async fn prepare(&self, request: &mut ApiRequest) -> Result<(), EcodashError>;
}

/// Inspects a response. `attempt` is 0 for the first send, 1 for the replay.
#[async_trait]
pub trait ResponseStage: Send + Sync {
    async fn inspect(
        &self,
        request: &ApiRequest,
        response: reqwest::Response,
        attempt: u32,
    ) -> Result<ResponseOutcome, EcodashError>;
}

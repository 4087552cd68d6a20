//! HTTP client for the simulation service.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use zerohour_core::boundary::{SimulationBoundary, TurnRequest, TurnResponse};
use zerohour_core::error::DomainError;

use crate::http::{decode, post_json};

/// Posts turn requests to the simulation endpoint.
#[derive(Debug, Clone)]
pub struct HttpSimulationClient {
    client: Client,
    url: String,
}

impl HttpSimulationClient {
    /// Creates a client for the endpoint at `url`.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SimulationBoundary for HttpSimulationClient {
    #[instrument(skip_all, fields(url = %self.url, is_init = request.is_init))]
    async fn simulate(&self, request: &TurnRequest) -> Result<TurnResponse, DomainError> {
        let body = post_json(&self.client, &self.url, request).await?;
        let response: TurnResponse = decode(&body)?;
        debug!(event_id = %response.event_id, choices = response.choices.len(), "simulation answered");
        Ok(response)
    }
}

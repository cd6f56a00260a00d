use std::io::{self, Write};

use tracing::{debug, info, warn};

use crate::adapter::{Client, RestError, RestRequest, RestResponse, RestResult};
use crate::config::{API_KEY_HEADER, RunnerConfig};
use crate::payload::ChairUpdate;

/// Sends one request per call and hands back whatever the server answered.
/// Status codes are never interpreted; only transport failures are errors.
#[derive(Clone)]
pub struct Runner {
    client: Client,
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: RunnerConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn update_request(&self, update: &ChairUpdate) -> RestResult<RestRequest> {
        let request = RestRequest::post(&self.config.url).with_json(update)?;
        Ok(self.decorate(request))
    }

    pub fn state_request(&self) -> RestRequest {
        self.decorate(RestRequest::get(&self.config.url))
    }

    pub fn health_request(&self) -> RestResult<RestRequest> {
        let url = self
            .config
            .health_url()
            .map_err(|err| RestError::internal(format!("invalid url {}: {err}", self.config.url)))?;
        Ok(self.decorate(RestRequest::get(url)))
    }

    /// `POST` the update to the configured chairs endpoint.
    pub async fn update(&self, update: &ChairUpdate) -> RestResult<RestResponse> {
        debug!(chair_id = %update.chair_id, is_occupied = update.is_occupied, "building chair update");
        let request = self.update_request(update)?;
        self.send(request).await
    }

    pub async fn state(&self) -> RestResult<RestResponse> {
        self.send(self.state_request()).await
    }

    pub async fn health(&self) -> RestResult<RestResponse> {
        let request = self.health_request()?;
        self.send(request).await
    }

    fn decorate(&self, mut request: RestRequest) -> RestRequest {
        if let Some(timeout) = self.config.timeout {
            request = request.with_timeout(timeout);
        }
        if let Some(api_key) = &self.config.api_key {
            request = request.with_header(API_KEY_HEADER, api_key.clone());
        }
        request
    }

    async fn send(&self, request: RestRequest) -> RestResult<RestResponse> {
        let method = request.method.clone();
        let url = request.url.clone();
        debug!(%method, %url, "sending request");

        match self.client.execute(request).await {
            Ok(response) => {
                info!(
                    %method,
                    %url,
                    status = response.status(),
                    elapsed = ?response.elapsed,
                    "response received"
                );
                Ok(response)
            }
            Err(err) => {
                warn!(%method, %url, kind = ?err.kind(), "request failed: {}", err.message);
                Err(err)
            }
        }
    }
}

/// Writes the two-line report: status code, then the body text as received.
pub fn report<W: Write>(out: &mut W, response: &RestResponse) -> io::Result<()> {
    writeln!(out, "Status Code: {}", response.status())?;
    writeln!(out, "Response Body: {}", response.text())?;
    out.flush()
}

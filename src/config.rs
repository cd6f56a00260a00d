use std::time::Duration;

use url::Url;

pub const DEFAULT_URL: &str = "http://localhost:3001/api/chairs";
pub const API_KEY_HEADER: &str = "x-api-key";
const HEALTH_PATH: &str = "/health";

/// Where and how the runner talks to the chairs server.
///
/// `timeout: None` leaves reqwest's default in place, which never times out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunnerConfig {
    pub url: String,
    pub timeout: Option<Duration>,
    pub api_key: Option<String>,
}

impl RunnerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: None,
            api_key: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// `/health` on the same origin as the chairs endpoint.
    pub fn health_url(&self) -> Result<String, url::ParseError> {
        let base = Url::parse(&self.url)?;
        Ok(base.join(HEALTH_PATH)?.to_string())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

//! HTTP readiness probe.

use std::time::Duration;

use thiserror::Error;

use crate::state::ResolvedConfig;
use crate::workload::falcosidekick::health_check_url;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct HealthProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HealthProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .user_agent("falcosidekick-operator-health-check")
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Probe the workload described by `state` on `host`.
    pub async fn check_workload(&self, host: &str, state: &ResolvedConfig) -> bool {
        self.check(&health_check_url(host, state)).await
    }

    pub async fn check(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => {
                let success = response.status().is_success();
                if !success {
                    tracing::warn!(
                        url,
                        status = %response.status(),
                        "Health check failed: non-success status"
                    );
                }
                success
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(
                    url,
                    timeout_secs = self.timeout.as_secs(),
                    "Health check failed: timeout"
                );
                false
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Health check failed: connection error");
                false
            }
        }
    }
}

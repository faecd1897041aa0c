use std::time::Duration;

use reqwest::Client;
use shared::domain::ReadinessVector;
use tracing::{debug, warn};

/// One-shot liveness check against the backend status endpoint.
#[derive(Debug, Clone)]
pub struct BackendProber {
    http: Client,
    status_url: String,
    timeout: Duration,
}

impl BackendProber {
    pub fn new(http: Client, status_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            status_url: status_url.into(),
            timeout,
        }
    }

    /// Never fails: any transport error, timeout or non-2xx reply yields an all-false vector.
    pub async fn probe(&self) -> ReadinessVector {
        let outcome = self
            .http
            .get(&self.status_url)
            .timeout(self.timeout)
            .send()
            .await;

        let healthy = match outcome {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(
                    url = %self.status_url,
                    status = %response.status(),
                    "backend probe: non-success status"
                );
                false
            }
            Err(err) => {
                warn!(
                    url = %self.status_url,
                    timed_out = err.is_timeout(),
                    error = %err,
                    "backend probe: request failed"
                );
                false
            }
        };

        debug!(url = %self.status_url, healthy, "backend probe finished");
        ReadinessVector::uniform(healthy)
    }
}

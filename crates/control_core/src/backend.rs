//! Request/response calls to the miner backend's job, stop and stats endpoints.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::BridgeError,
    protocol::{MineRequest, MiningJobResult, StatsSnapshot},
};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    request_timeout: Duration,
    job_timeout: Option<Duration>,
}

impl BackendClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        request_timeout: Duration,
        job_timeout: Option<Duration>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
            job_timeout,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Runs one nonce search to completion. The difficulty is passed through unchecked.
    pub async fn start_job(&self, difficulty: i64) -> Result<MiningJobResult, BridgeError> {
        let mut request = self.http.post(self.endpoint("/api/mine")).json(&MineRequest {
            target_difficulty: difficulty,
        });
        if let Some(limit) = self.job_timeout {
            request = request.timeout(limit);
        }

        info!(difficulty, "backend: starting mining job");
        let response = send(request).await?;
        let response = ensure_success(response).await?;
        let result: MiningJobResult = decode_json(response).await?;
        if !result.has_well_formed_hash() {
            return Err(BridgeError::MalformedResponse(format!(
                "job hash is not a hex digest: {:?}",
                result.hash
            )));
        }
        info!(
            nonce = result.nonce,
            hash = %result.hash,
            iterations = result.iterations,
            "backend: mining job finished"
        );
        Ok(result)
    }

    /// Forwards the backend's acknowledgment as-is, whatever its status code.
    pub async fn stop_job(&self) -> Result<serde_json::Value, BridgeError> {
        let request = self
            .http
            .post(self.endpoint("/api/stop"))
            .timeout(self.request_timeout);
        let response = send(request).await?;
        debug!(status = %response.status(), "backend: stop acknowledged");
        decode_json(response).await
    }

    pub async fn fetch_stats(&self) -> Result<StatsSnapshot, BridgeError> {
        let request = self
            .http
            .get(self.endpoint("/api/stats"))
            .timeout(self.request_timeout);
        let response = send(request).await?;
        let response = ensure_success(response).await?;
        decode_json(response).await
    }
}

async fn send(request: RequestBuilder) -> Result<Response, BridgeError> {
    request.send().await.map_err(|err| {
        if err.is_timeout() {
            BridgeError::Timeout
        } else {
            BridgeError::Unreachable(err.to_string())
        }
    })
}

async fn ensure_success(response: Response) -> Result<Response, BridgeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read response text".to_string());
    let message = match body.trim() {
        "" => status.to_string(),
        trimmed => format!("{status}: {trimmed}"),
    };
    Err(BridgeError::Backend(message))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, BridgeError> {
    response.json::<T>().await.map_err(|err| {
        if err.is_timeout() {
            BridgeError::Timeout
        } else if err.is_decode() {
            BridgeError::MalformedResponse(err.to_string())
        } else {
            BridgeError::Unreachable(err.to_string())
        }
    })
}

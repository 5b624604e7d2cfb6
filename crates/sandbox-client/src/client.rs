use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::SandboxConfig;
use crate::error::{ClientError, Result};
use crate::types::{SandboxVerdict, SubmissionBody, SubmissionToken, SubmitResponse};

/// Remote execution service: asynchronous submit/poll plus a liveness probe.
///
/// The trait is the substitution seam for the orchestrator and its tests;
/// [`SandboxClient`] is the HTTP implementation.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Submit code for execution, returning the token identifying the run.
    async fn submit(&self, code: &str, language_id: u32, stdin: &str)
    -> Result<SubmissionToken>;

    /// Fetch the current verdict for a submission. May be non-terminal.
    async fn poll(&self, token: &SubmissionToken) -> Result<SandboxVerdict>;

    /// Lightweight availability probe. Reports instead of failing.
    async fn health_check(&self) -> bool;
}

/// HTTP client for a Judge0-compatible execution service.
///
/// Owns the connection pool, base URL, per-call timeouts, and the fixed
/// resource limits attached to every submission.
pub struct SandboxClient {
    client: reqwest::Client,
    config: SandboxConfig,
}

impl SandboxClient {
    pub fn new(config: SandboxConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Init(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Sandbox for SandboxClient {
    async fn submit(
        &self,
        code: &str,
        language_id: u32,
        stdin: &str,
    ) -> Result<SubmissionToken> {
        let limits = &self.config.limits;
        let body = SubmissionBody {
            source_code: code,
            language_id,
            stdin,
            cpu_time_limit: limits.cpu_time_secs,
            wall_time_limit: limits.wall_time_secs,
            memory_limit: limits.memory_kb,
            stack_limit: limits.stack_kb,
        };

        let url = format!(
            "{}/submissions?base64_encoded=false&wait=false",
            self.config.base_url
        );
        let resp = self
            .client
            .post(&url)
            .timeout(self.config.submit_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Submit(transport_error(&e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Submit(status_error(status)));
        }

        let decoded: SubmitResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Submit(format!("decode: {e}")))?;

        match decoded.token {
            Some(token) if !token.is_empty() => {
                let token = SubmissionToken::new(token);
                debug!(token = %token, language_id, "submission accepted");
                Ok(token)
            }
            _ => Err(ClientError::Submit("no token in response".into())),
        }
    }

    async fn poll(&self, token: &SubmissionToken) -> Result<SandboxVerdict> {
        let url = format!(
            "{}/submissions/{}?base64_encoded=false&fields=*",
            self.config.base_url, token
        );
        let resp = self
            .client
            .get(&url)
            .timeout(self.config.poll_timeout)
            .send()
            .await
            .map_err(|e| ClientError::Poll(transport_error(&e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Poll(status_error(status)));
        }

        resp.json()
            .await
            .map_err(|e| ClientError::Poll(format!("decode: {e}")))
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/system_info", self.config.base_url);
        let resp = match self
            .client
            .get(&url)
            .timeout(self.config.health_timeout)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "execution service health check failed");
                return false;
            }
        };

        if !resp.status().is_success() {
            warn!(status = %resp.status(), "execution service health check rejected");
            return false;
        }

        // A live deployment reports its host architecture; anything else is
        // some other service answering on the same port.
        match resp.text().await {
            Ok(body) => body.contains("Architecture"),
            Err(e) => {
                warn!(error = %e, "execution service health check body unreadable");
                false
            }
        }
    }
}

/// Name the transient category in the message so the orchestrator's retry
/// predicate can match on it.
fn transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timeout".into()
    } else if e.is_connect() {
        format!("connection error: {e}")
    } else {
        e.to_string()
    }
}

fn status_error(status: StatusCode) -> String {
    if status.is_server_error() {
        format!("service unavailable ({status})")
    } else {
        format!("unexpected status {status}")
    }
}

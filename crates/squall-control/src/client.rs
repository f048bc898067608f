use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Response, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Serialize;
use tracing::{debug, trace};

use squall_model::{AppKey, ConnectRequest, ConnectResponse, HealthReport, TaskReport};

use crate::error::ControlError;

pub const DEFAULT_ENDPOINT: &str = "https://api.squall.dev/v1";

const NEXT_PATH: &str = "/apps/operations/next";
const REPORT_PATH: &str = "/apps/operations/report";
const HEALTH_PATH: &str = "/apps/versions/health";
const CONNECT_PATH: &str = "/apps/version/connect";

#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Base URL; the request paths are appended to it.
    pub endpoint: String,
    pub token: String,
    /// Client-wide request timeout.
    pub timeout: Duration,
}

impl ControlConfig {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of asking for the next task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// 200 with the raw task body, decoded by the caller.
    Task(String),
    /// 204: nothing queued.
    Empty,
    /// Anything else.
    Status(u16),
}

#[async_trait]
pub trait ControlPlane: Send + Sync + 'static {
    async fn next_task(&self, key: &AppKey, timeout: Duration) -> Result<Fetched, ControlError>;

    async fn report_task(&self, report: &TaskReport) -> Result<(), ControlError>;

    async fn report_health(&self, report: &HealthReport) -> Result<(), ControlError>;
}

#[derive(Debug, Clone)]
pub struct HttpControlPlane {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct NextTaskRequest<'a> {
    app_id: &'a str,
    version: &'a str,
}

impl HttpControlPlane {
    pub fn new(cfg: &ControlConfig) -> Result<Self, ControlError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", cfg.token.trim()))
            .map_err(|_| ControlError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(cfg.timeout)
            .user_agent(concat!("squall/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Register the resource definitions of a version.
    pub async fn connect_version(
        &self,
        request: &ConnectRequest,
    ) -> Result<ConnectResponse, ControlError> {
        let response = ensure_success(self.post(CONNECT_PATH, request).send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ControlError::InvalidResponse(format!("failed to parse response: {e}, body: {body}"))
        })
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.endpoint);
        trace!(target: "squall.control", %url, "post");
        self.client.post(url).json(body)
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn next_task(&self, key: &AppKey, timeout: Duration) -> Result<Fetched, ControlError> {
        let body = NextTaskRequest {
            app_id: &key.app_id,
            version: &key.version,
        };
        let response = self.post(NEXT_PATH, &body).timeout(timeout).send().await?;

        match response.status() {
            StatusCode::OK => Ok(Fetched::Task(response.text().await?)),
            StatusCode::NO_CONTENT => Ok(Fetched::Empty),
            other => {
                let text = response.text().await.unwrap_or_default();
                debug!(target: "squall.control", status = other.as_u16(), body = %text, "unexpected fetch status");
                Ok(Fetched::Status(other.as_u16()))
            }
        }
    }

    async fn report_task(&self, report: &TaskReport) -> Result<(), ControlError> {
        ensure_success(self.post(REPORT_PATH, report).send().await?).await?;
        Ok(())
    }

    async fn report_health(&self, report: &HealthReport) -> Result<(), ControlError> {
        ensure_success(self.post(HEALTH_PATH, report).send().await?).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ControlError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ControlError::Rejected {
        status: status.as_u16(),
        body,
    })
}

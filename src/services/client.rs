use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use uuid::Uuid;

use crate::models::api::{
    ApiErrorBody, HealthResponse, StatusResponse, SubmitResponse, SystemStatsResponse,
    TaskListResponse,
};
use crate::models::task::{OutputFormat, Task};

/// The three backend operations the poller depends on.
///
/// Kept behind a trait so the poller can be exercised in tests with scripted
/// responses instead of a live service.
#[async_trait]
pub trait ConvertBackend: Send + Sync {
    /// Upload a file for conversion; returns the backend-assigned task id.
    async fn submit(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        format: OutputFormat,
    ) -> Result<Uuid, ApiError>;

    /// Fetch the current state of one task.
    async fn fetch_status(&self, task_id: Uuid) -> Result<Task, ApiError>;

    /// Fetch the converted model bytes. Only valid once the task completed.
    async fn download(&self, task_id: Uuid) -> Result<Vec<u8>, ApiError>;
}

/// reqwest-backed client for the conversion service HTTP API.
pub struct HttpConvertClient {
    http: Client,
    base_url: String,
}

impl HttpConvertClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(ApiError::Http)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET /api/health — service liveness and queue depth.
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        let response = self
            .http
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await?;
        read_json(response).await
    }

    /// GET /api/convert/list — every task the backend currently knows.
    pub async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let response = self
            .http
            .get(format!("{}/api/convert/list", self.base_url))
            .send()
            .await?;
        let body: TaskListResponse = read_json(response).await?;
        Ok(body.tasks)
    }

    /// GET /api/system/stats — aggregate task counts and storage usage.
    pub async fn system_stats(&self) -> Result<SystemStatsResponse, ApiError> {
        let response = self
            .http
            .get(format!("{}/api/system/stats", self.base_url))
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl ConvertBackend for HttpConvertClient {
    async fn submit(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        format: OutputFormat,
    ) -> Result<Uuid, ApiError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_for(filename))
            .map_err(ApiError::Http)?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("format", format.to_string());

        let response = self
            .http
            .post(format!("{}/api/convert/start", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let body: SubmitResponse = read_json(response).await?;
        Ok(body.task_id)
    }

    async fn fetch_status(&self, task_id: Uuid) -> Result<Task, ApiError> {
        let response = self
            .http
            .get(format!("{}/api/convert/status/{}", self.base_url, task_id))
            .send()
            .await?;
        let body: StatusResponse = read_json(response).await?;
        Ok(body.task)
    }

    async fn download(&self, task_id: Uuid) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(format!(
                "{}/api/convert/download/{}",
                self.base_url, task_id
            ))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: error_message(response, status).await,
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Decode a success body, or turn a non-2xx response into `ApiError::Rejected`
/// with the backend's `{"error": ...}` message when one is present.
async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message: error_message(response, status).await,
        });
    }
    response.json::<T>().await.map_err(ApiError::Http)
}

async fn error_message(response: reqwest::Response, status: reqwest::StatusCode) -> String {
    match response.json::<ApiErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    }
}

fn mime_for(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        Some(ext) if ext.eq_ignore_ascii_case("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

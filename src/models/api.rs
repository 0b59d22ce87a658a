use serde::Deserialize;
use uuid::Uuid;

use super::task::Task;

/// Response from `POST /api/convert/start`.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub success: bool,
    pub task_id: Uuid,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status_url: Option<String>,
}

/// Response from `GET /api/convert/status/{task_id}`.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub success: bool,
    pub task: Task,
}

/// Response from `GET /api/convert/list`.
#[derive(Debug, Deserialize)]
pub struct TaskListResponse {
    #[serde(default)]
    pub success: bool,
    pub tasks: Vec<Task>,
    pub total_count: usize,
}

/// Response from `GET /api/system/stats`.
#[derive(Debug, Deserialize)]
pub struct SystemStatsResponse {
    pub tasks: TaskCounts,
    pub storage: StorageUsage,
}

#[derive(Debug, Deserialize)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub processing: usize,
    pub queued: usize,
}

#[derive(Debug, Deserialize)]
pub struct StorageUsage {
    pub uploads_bytes: u64,
    pub outputs_bytes: u64,
    pub total_bytes: u64,
}

/// Response from `GET /api/health`.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub active_tasks: usize,
    #[serde(default)]
    pub queued_tasks: usize,
}

/// Error payload the backend attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

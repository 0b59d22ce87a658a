use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Status of a conversion task as reported by the backend.
///
/// Progression is forward-only: pending → processing → completed | failed.
/// `Failed` is a legitimate terminal state, not a client-side error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Terminal statuses never change on a later refresh.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Output model formats accepted by the conversion backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    Glb,
    Obj,
    Stl,
    Ply,
}

/// One conversion job as tracked client-side.
///
/// Records are replaced wholesale on every successful status refresh;
/// `message` carries the backend's latest human-readable note, not a log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    #[serde(rename = "task_id")]
    pub id: Uuid,
    pub status: TaskStatus,
    pub progress: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl Task {
    /// Fresh registry entry for a just-accepted submission.
    pub fn pending(id: Uuid) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            progress: 0,
            message: String::new(),
            output_path: None,
            start_time: None,
            end_time: None,
        }
    }
}

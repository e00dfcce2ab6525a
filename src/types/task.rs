use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Processing state of a task as reported by the service.
///
/// Unrecognised values are kept in [`TaskStatus::Unknown`] and treated as
/// non-terminal, so a newer service version cannot end a wait early.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Submitted,
    Queued,
    InProgress,
    Finished,
    Failed,
    NotEnoughCredits,
    Deleted,
    Unknown(String),
}

impl TaskStatus {
    /// Finished, Failed, NotEnoughCredits and Deleted end polling.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Finished
                | TaskStatus::Failed
                | TaskStatus::NotEnoughCredits
                | TaskStatus::Deleted
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Submitted => "Submitted",
            TaskStatus::Queued => "Queued",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Finished => "Finished",
            TaskStatus::Failed => "Failed",
            TaskStatus::NotEnoughCredits => "NotEnoughCredits",
            TaskStatus::Deleted => "Deleted",
            TaskStatus::Unknown(s) => s.as_str(),
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        // The service spells finished/failed as Completed/ProcessingFailed.
        match s.as_str() {
            "Submitted" => TaskStatus::Submitted,
            "Queued" => TaskStatus::Queued,
            "InProgress" => TaskStatus::InProgress,
            "Completed" | "Finished" => TaskStatus::Finished,
            "ProcessingFailed" | "Failed" => TaskStatus::Failed,
            "NotEnoughCredits" => TaskStatus::NotEnoughCredits,
            "Deleted" => TaskStatus::Deleted,
            _ => TaskStatus::Unknown(s),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        TaskStatus::from(s.to_string())
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one recognition task.
///
/// Every status query yields a fresh `Task`; snapshots are never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_change_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<u32>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_processing_time: Option<u64>,
    /// Server-suggested delay before the next status query, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_status_check_timeout: Option<u64>,
    /// Present once the task is finished.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Present once the task has failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    pub fn new(task_id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            task_id: task_id.into(),
            status,
            registration_time: None,
            status_change_time: None,
            files_count: None,
            credits: None,
            estimated_processing_time: None,
            request_status_check_timeout: None,
            result_urls: Vec::new(),
            description: None,
            error: None,
        }
    }

    pub fn with_result_urls(mut self, urls: Vec<String>) -> Self {
        self.result_urls = urls;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn suggested_poll_interval(&self) -> Option<Duration> {
        self.request_status_check_timeout
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn estimated_processing_time(&self) -> Option<Duration> {
        self.estimated_processing_time.map(Duration::from_secs)
    }
}

/// Listing response. The service wraps the array in `{"tasks": [...]}`;
/// a bare array is accepted too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TaskListRepr")]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskListRepr {
    Wrapped {
        #[serde(default)]
        tasks: Option<Vec<Task>>,
    },
    Bare(Vec<Task>),
}

impl From<TaskListRepr> for TaskList {
    fn from(repr: TaskListRepr) -> Self {
        let tasks = match repr {
            TaskListRepr::Wrapped { tasks } => tasks.unwrap_or_default(),
            TaskListRepr::Bare(tasks) => tasks,
        };
        TaskList { tasks }
    }
}

use serde::{Deserialize, Serialize};

use crate::Resource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Ok,
    Error,
}

/// Outcome of one task, posted back to the control plane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub task_id: String,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<TaskResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskReport {
    pub fn ok(task_id: impl Into<String>, response: TaskResponse) -> Self {
        Self {
            task_id: task_id.into(),
            status: ReportStatus::Ok,
            response: Some(response),
            message: None,
        }
    }

    pub fn error(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: ReportStatus::Error,
            response: None,
            message: Some(message.into()),
        }
    }
}

/// Successful task payload, discriminated by `response_type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response_type", rename_all = "snake_case")]
pub enum TaskResponse {
    ExecuteResourceOperation {
        resource: Resource,
    },
    ListResources {
        resources: Vec<Resource>,
        #[serde(default)]
        next: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Disrupted,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReportItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// All health items gathered in one pass for one App version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub app_id: String,
    pub version: String,
    pub health_reports: Vec<HealthReportItem>,
}

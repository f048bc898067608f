use serde::{Deserialize, Serialize};

use crate::{Metadata, ModelError, Properties, ResourceRef};

/// One unit of work handed out by the control plane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NextTask {
    pub task_id: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub task: TaskPayload,
}

impl NextTask {
    /// Decode a `200 OK` next-task body.
    ///
    /// The `task.request_type` discriminator must name one of the known kinds.
    pub fn from_json(body: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(body)?)
    }
}

/// Task body, discriminated by `request_type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum TaskPayload {
    ExecuteResourceOperation(ExecuteResourceOperation),
    ExecuteResourceAction(ExecuteResourceAction),
    ListResources(ListResources),
}

impl TaskPayload {
    /// Wire name of the task kind, used in logs and unsupported-kind reports.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskPayload::ExecuteResourceOperation(_) => "execute_resource_operation",
            TaskPayload::ExecuteResourceAction(_) => "execute_resource_action",
            TaskPayload::ListResources(_) => "list_resources",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResourceOperation {
    /// One of `create`, `update`, `delete`, `read`; validated during translation.
    pub operation: String,
    pub resource: ResourceRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_variables: Option<Vec<EnvironmentVariable>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResourceAction {
    pub action: String,
    pub resource: ResourceRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_variables: Option<Vec<EnvironmentVariable>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListResources {
    pub resource: ResourceRef,
    /// Pagination cursor; empty on the first page.
    #[serde(default)]
    pub next: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
    /// `variable`, `secret`, `certificate`, `private_key` or `public_key`.
    #[serde(rename = "type", default)]
    pub kind: String,
}

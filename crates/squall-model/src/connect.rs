use serde::{Deserialize, Serialize};

use crate::{Links, Properties};

/// Capabilities of one resource type, as registered with the control plane.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub display_name: String,
    pub description: String,
    pub lifecycle_stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_json_schema: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_input_schema: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_input_schema: Option<Properties>,
    pub create_supported: bool,
    pub read_supported: bool,
    pub update_supported: bool,
    pub delete_supported: bool,
    pub list_supported: bool,
    pub healthcheck_supported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions_markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub app_id: String,
    pub version: String,
    pub resources: Vec<ResourceDefinition>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub metadata: Option<ConnectMetadata>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectMetadata {
    #[serde(default)]
    pub app_url: Option<String>,
}

impl ConnectResponse {
    pub fn app_url(&self) -> Option<&str> {
        self.metadata.as_ref()?.app_url.as_deref()
    }
}

use serde::{Deserialize, Serialize};

use crate::Properties;

/// Resource addressed by a task: only the type and (optionally) the external id are known.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub external_id: String,
}

/// Resource as the control plane stores it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<LinkItem>>,
}

impl Links {
    pub fn items(&self) -> &[LinkItem] {
        self.links.as_deref().unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    pub title: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: LinkKind,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Documentation,
    Administration,
    Support,
    Endpoint,
    External,
    #[default]
    #[serde(other)]
    Unknown,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Documentation => "documentation",
            LinkKind::Administration => "administration",
            LinkKind::Support => "support",
            LinkKind::Endpoint => "endpoint",
            LinkKind::External => "external",
            LinkKind::Unknown => "unknown",
        }
    }
}

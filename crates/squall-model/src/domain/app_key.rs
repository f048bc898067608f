use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Identity of one deployable App version.
///
/// Serialized as `{"app_id": ..., "version": ...}`, which is also the body of the
/// next-task request. Displayed and parsed as `<app_id>:<version>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppKey {
    pub app_id: String,
    pub version: String,
}

impl AppKey {
    pub fn new(app_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            version: version.into(),
        }
    }

    /// URL path segment the App server mounts this version under.
    pub fn path_segment(&self) -> String {
        format!("{}-{}", self.app_id, self.version)
    }
}

impl fmt::Display for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.app_id, self.version)
    }
}

impl FromStr for AppKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((id, version)) if !id.trim().is_empty() && !version.trim().is_empty() => {
                Ok(AppKey::new(id.trim(), version.trim()))
            }
            _ => Err(ModelError::InvalidAppKey(s.to_string())),
        }
    }
}

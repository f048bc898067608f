use std::{fmt, sync::Arc};

use squall_model::AppKey;

use crate::client::AppClient;

/// Handle to one reachable App version.
///
/// Created once at startup and never mutated; clones share the same client.
#[derive(Clone)]
pub struct Runner {
    key: AppKey,
    client: Arc<dyn AppClient>,
}

impl Runner {
    pub fn new(key: AppKey, client: Arc<dyn AppClient>) -> Self {
        Self { key, client }
    }

    pub fn key(&self) -> &AppKey {
        &self.key
    }

    pub fn app_id(&self) -> &str {
        &self.key.app_id
    }

    pub fn version(&self) -> &str {
        &self.key.version
    }

    pub fn client(&self) -> &dyn AppClient {
        self.client.as_ref()
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner").field("key", &self.key).finish_non_exhaustive()
    }
}

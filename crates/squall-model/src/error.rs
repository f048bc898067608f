use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid app reference {0:?} (expected <app_id>:<version>)")]
    InvalidAppKey(String),

    #[error("failed to decode task: {0}")]
    Decode(#[from] serde_json::Error),
}

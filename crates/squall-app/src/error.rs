use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid app endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("rpc failed ({:?}): {}", .0.code(), .0.message())]
    Status(#[source] Box<tonic::Status>),

    #[error("rpc timed out after {0:?}")]
    Timeout(Duration),

    #[error("app unreachable after {attempts} attempts: {source}")]
    Unreachable {
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },
}

impl From<tonic::Status> for AppError {
    fn from(status: tonic::Status) -> Self {
        AppError::Status(Box::new(status))
    }
}

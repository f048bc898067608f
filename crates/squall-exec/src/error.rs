use std::{path::PathBuf, time::Duration};

use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("build directory does not exist: {0}")]
    MissingBuildDir(PathBuf),
    #[error("invalid build directory: {0}")]
    NotADirectory(PathBuf),
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("app process closed stdout before announcing its port")]
    NoPort,
    #[error("expected a port number on the first stdout line, got {0:?}")]
    InvalidPort(String),
    #[error("app process did not announce its port within {0:?}")]
    StartupTimeout(Duration),
    #[error("app startup cancelled")]
    Cancelled,
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}

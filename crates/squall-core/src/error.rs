use thiserror::Error;

use squall_app::AppError;
use squall_control::ControlError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("app returned no resource")]
    MissingResource,
}

/// Failure of one loop iteration. Never escapes a loop; logged at the boundary.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("unsupported task kind: {0}")]
    Unsupported(&'static str),
}

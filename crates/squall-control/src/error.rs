use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("control plane rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("api token contains characters not allowed in a header")]
    InvalidToken,

    #[error("token not found. Please login with 'squall auth login' or set the SQUALL_TOKEN environment variable")]
    TokenNotFound,

    #[error("read token file {path}: {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token store: {0}")]
    Store(String),
}

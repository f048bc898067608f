//! Client for the remote control plane that hands out tasks and collects reports.

mod error;
pub use error::ControlError;

mod client;
pub use client::{ControlConfig, ControlPlane, DEFAULT_ENDPOINT, Fetched, HttpControlPlane};

mod token;
pub use token::{
    FileTokenStore, TOKEN_ENV, TOKEN_FILE_ENV, TokenStore, resolve_token, resolve_token_from_env,
};
#[cfg(feature = "keyring")]
pub use token::KeyringTokenStore;

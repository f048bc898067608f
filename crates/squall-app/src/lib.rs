//! Client side of the local App RPC contract.
//!
//! An App server hosts one or more App versions, each mounted under
//! `/<app_id>-<version>`. A [`Runner`] is this process's handle to one of them.

pub mod proto {
    tonic::include_proto!("squall.app.v1");
}

mod error;
pub use error::AppError;

mod client;
pub use client::{AppClient, GrpcAppClient};

mod runner;
pub use runner::Runner;

mod registry;
pub use registry::{ProbePolicy, connect_runner, probe, register, start_runners};

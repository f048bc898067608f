//! Control-plane vocabulary shared by the squall crates.
//!
//! Everything here is plain serde data: no I/O, no runtime. The local RPC vocabulary
//! lives in `squall-app`; the mapping between the two lives in `squall-core`.

mod error;
pub use error::ModelError;

mod domain;
pub use domain::*;

mod task;
pub use task::{
    EnvironmentVariable, ExecuteResourceAction, ExecuteResourceOperation, ListResources, NextTask,
    TaskPayload,
};

mod report;
pub use report::{HealthReport, HealthReportItem, HealthStatus, ReportStatus, TaskReport, TaskResponse};

mod connect;
pub use connect::{ConnectMetadata, ConnectRequest, ConnectResponse, ResourceDefinition};

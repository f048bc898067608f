use squall_app::proto;
use squall_model::{HealthStatus, LinkKind, OwnerKind};

use crate::error::TranslateError;

/// Remote operation name to the RPC operation. `list` has its own task kind and is rejected.
pub fn operation(name: &str) -> Result<proto::ResourceOperation, TranslateError> {
    match name {
        "create" => Ok(proto::ResourceOperation::Create),
        "update" => Ok(proto::ResourceOperation::Update),
        "delete" => Ok(proto::ResourceOperation::Delete),
        "read" => Ok(proto::ResourceOperation::Read),
        other => Err(TranslateError::UnsupportedOperation(other.to_string())),
    }
}

/// Unknown kinds are passed on as unspecified.
pub fn env_kind(kind: &str) -> proto::EnvironmentVariableType {
    match kind {
        "variable" => proto::EnvironmentVariableType::Var,
        "secret" => proto::EnvironmentVariableType::Secret,
        "certificate" => proto::EnvironmentVariableType::Certificate,
        "private_key" => proto::EnvironmentVariableType::PrivateKey,
        "public_key" => proto::EnvironmentVariableType::PublicKey,
        _ => proto::EnvironmentVariableType::Unspecified,
    }
}

pub fn owner_kind(kind: OwnerKind) -> proto::OwnerType {
    match kind {
        OwnerKind::User => proto::OwnerType::User,
        OwnerKind::Team => proto::OwnerType::Team,
        OwnerKind::Unknown => proto::OwnerType::Unspecified,
    }
}

/// `None` for an unspecified status: the App has no opinion and nothing is reported.
pub fn health_status(raw: i32) -> Option<HealthStatus> {
    match proto::HealthCheckStatus::try_from(raw) {
        Ok(proto::HealthCheckStatus::Unspecified) => None,
        Ok(proto::HealthCheckStatus::Healthy) => Some(HealthStatus::Healthy),
        Ok(proto::HealthCheckStatus::Degraded) => Some(HealthStatus::Degraded),
        Ok(proto::HealthCheckStatus::Disrupted) => Some(HealthStatus::Disrupted),
        Err(_) => Some(HealthStatus::Unknown),
    }
}

pub fn link_kind_to_proto(kind: LinkKind) -> proto::LinkType {
    match kind {
        LinkKind::Documentation => proto::LinkType::Documentation,
        LinkKind::Administration => proto::LinkType::Administration,
        LinkKind::Support => proto::LinkType::Support,
        LinkKind::Endpoint => proto::LinkType::Endpoint,
        LinkKind::External => proto::LinkType::External,
        LinkKind::Unknown => proto::LinkType::Unspecified,
    }
}

pub fn link_kind_from_proto(raw: i32) -> LinkKind {
    match proto::LinkType::try_from(raw) {
        Ok(proto::LinkType::Documentation) => LinkKind::Documentation,
        Ok(proto::LinkType::Administration) => LinkKind::Administration,
        Ok(proto::LinkType::Support) => LinkKind::Support,
        Ok(proto::LinkType::Endpoint) => LinkKind::Endpoint,
        Ok(proto::LinkType::External) => LinkKind::External,
        Ok(proto::LinkType::Unspecified) | Err(_) => LinkKind::Unknown,
    }
}

pub fn lifecycle_stage(raw: i32) -> &'static str {
    match proto::LifecycleStage::try_from(raw) {
        Ok(proto::LifecycleStage::Alpha) => "alpha",
        Ok(proto::LifecycleStage::Beta) => "beta",
        Ok(proto::LifecycleStage::Ga) => "ga",
        Ok(proto::LifecycleStage::Unspecified) | Err(_) => "unspecified",
    }
}

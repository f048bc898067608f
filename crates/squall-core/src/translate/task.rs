use squall_app::proto;
use squall_model::{
    EnvironmentVariable, ExecuteResourceOperation, ListResources, Metadata, Owner, TaskResponse,
};

use super::enums::{env_kind, operation, owner_kind};
use super::resource::{resource_from_proto, resource_ref_to_proto};
use super::value::to_struct;
use crate::error::TranslateError;

pub fn metadata_to_proto(metadata: &Metadata) -> proto::Metadata {
    proto::Metadata {
        project_id: metadata.project_id.clone(),
        project_name: metadata.project_name.clone(),
        author: Some(owner_to_proto(&metadata.author)),
        owners: metadata.owners.iter().map(owner_to_proto).collect(),
    }
}

pub fn owner_to_proto(owner: &Owner) -> proto::Owner {
    proto::Owner {
        email: owner.email.clone(),
        name: owner.name.clone(),
        r#type: owner_kind(owner.kind) as i32,
    }
}

/// Key and value pass through unchanged; only the kind is mapped.
pub fn env_to_proto(env: &EnvironmentVariable) -> proto::EnvironmentVariable {
    proto::EnvironmentVariable {
        key: env.name.clone(),
        value: env.value.clone(),
        r#type: env_kind(&env.kind) as i32,
    }
}

pub fn operation_request(
    metadata: &Metadata,
    task: &ExecuteResourceOperation,
) -> Result<proto::ExecuteResourceOperationRequest, TranslateError> {
    let op = operation(&task.operation)?;

    Ok(proto::ExecuteResourceOperationRequest {
        resource: Some(resource_ref_to_proto(&task.resource)),
        operation: op as i32,
        input: Some(task.input.as_ref().map(to_struct).unwrap_or_default()),
        metadata: Some(metadata_to_proto(metadata)),
        environment_variables: task
            .environment_variables
            .iter()
            .flatten()
            .map(env_to_proto)
            .collect(),
    })
}

pub fn list_request(metadata: &Metadata, task: &ListResources) -> proto::ListResourcesRequest {
    proto::ListResourcesRequest {
        resource: Some(proto::Resource {
            r#type: task.resource.kind.clone(),
            ..Default::default()
        }),
        next: task.next.clone(),
        metadata: Some(metadata_to_proto(metadata)),
    }
}

pub fn operation_response(
    response: proto::ExecuteResourceOperationResponse,
) -> Result<TaskResponse, TranslateError> {
    let resource = response.resource.ok_or(TranslateError::MissingResource)?;
    Ok(TaskResponse::ExecuteResourceOperation {
        resource: resource_from_proto(resource),
    })
}

pub fn list_response(response: proto::ListResourcesResponse) -> TaskResponse {
    TaskResponse::ListResources {
        resources: response
            .resources
            .into_iter()
            .map(resource_from_proto)
            .collect(),
        next: response.next,
    }
}

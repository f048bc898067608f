//! Pure mappings between the control-plane vocabulary (`squall-model`) and the App
//! RPC vocabulary (`squall-app::proto`). Explicit enumerations only.

mod definition;
mod enums;
mod resource;
mod task;
mod value;

pub use definition::definition_from_proto;
pub use enums::{
    env_kind, health_status, lifecycle_stage, link_kind_from_proto, link_kind_to_proto,
    operation, owner_kind,
};
pub use resource::{
    links_from_proto, links_to_proto, resource_from_proto, resource_ref_to_proto,
    resource_to_proto,
};
pub use task::{
    env_to_proto, list_request, list_response, metadata_to_proto, operation_request,
    operation_response, owner_to_proto,
};
pub use value::{from_proto_value, from_struct, to_proto_value, to_struct};

use squall_app::proto;
use squall_model::ResourceDefinition;

use super::enums::lifecycle_stage;
use super::resource::links_from_proto;
use super::value::from_struct;

/// Describe output to the registration payload sent on connect.
pub fn definition_from_proto(def: proto::ResourceDefinition) -> ResourceDefinition {
    ResourceDefinition {
        lifecycle_stage: lifecycle_stage(def.lifecycle_stage).to_string(),
        kind: def.r#type,
        display_name: def.display_name,
        description: def.description,
        property_json_schema: def.properties_schema.map(from_struct),
        create_input_schema: def
            .create_input_schema
            .filter(|_| def.create_supported)
            .map(from_struct),
        update_input_schema: def
            .update_input_schema
            .filter(|_| def.update_supported)
            .map(from_struct),
        create_supported: def.create_supported,
        read_supported: def.read_supported,
        update_supported: def.update_supported,
        delete_supported: def.delete_supported,
        list_supported: def.list_supported,
        healthcheck_supported: def.healthcheck_supported,
        instructions_markdown: (!def.instructions_markdown.is_empty())
            .then_some(def.instructions_markdown),
        links: (!def.links.is_empty()).then(|| links_from_proto(def.links)),
    }
}

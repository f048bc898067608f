use squall_app::proto;
use squall_model::{LinkItem, Links, Resource, ResourceRef};

use super::enums::{link_kind_from_proto, link_kind_to_proto};
use super::value::{from_struct, to_struct};

/// App resource to the control-plane shape. Properties and links are always present.
pub fn resource_from_proto(resource: proto::Resource) -> Resource {
    Resource {
        kind: resource.r#type,
        external_id: resource.external_id,
        display_name: resource.display_name,
        properties: Some(resource.properties.map(from_struct).unwrap_or_default()),
        links: Some(links_from_proto(resource.links)),
    }
}

pub fn resource_to_proto(resource: &Resource) -> proto::Resource {
    proto::Resource {
        r#type: resource.kind.clone(),
        external_id: resource.external_id.clone(),
        display_name: resource.display_name.clone(),
        properties: resource.properties.as_ref().map(to_struct),
        links: resource
            .links
            .as_ref()
            .map(|l| links_to_proto(l.items()))
            .unwrap_or_default(),
    }
}

/// Task subject: only type and external id are known.
pub fn resource_ref_to_proto(resource: &ResourceRef) -> proto::Resource {
    proto::Resource {
        r#type: resource.kind.clone(),
        external_id: resource.external_id.clone(),
        ..Default::default()
    }
}

pub fn links_from_proto(links: Vec<proto::Link>) -> Links {
    Links {
        links: Some(
            links
                .into_iter()
                .map(|link| LinkItem {
                    kind: link_kind_from_proto(link.r#type),
                    title: link.title,
                    url: link.url,
                })
                .collect(),
        ),
    }
}

pub fn links_to_proto(links: &[LinkItem]) -> Vec<proto::Link> {
    links
        .iter()
        .map(|link| proto::Link {
            title: link.title.clone(),
            url: link.url.clone(),
            r#type: link_kind_to_proto(link.kind) as i32,
        })
        .collect()
}

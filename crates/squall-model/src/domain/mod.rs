mod app_key;
pub use app_key::AppKey;

mod metadata;
pub use metadata::{Metadata, Owner, OwnerKind};

mod resource;
pub use resource::{LinkItem, LinkKind, Links, Resource, ResourceRef};

/// Opaque property bag carried by resources and task inputs.
pub type Properties = serde_json::Map<String, serde_json::Value>;

use std::collections::BTreeMap;

use relata_core_types::{ResourceId, ResourceRef, ResourceType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The dynamic record repositories traffic in
///
/// A resource carries its concrete type (which may be a strict descendant of
/// a relationship's declared target type), an opaque JSON attribute map, and
/// one slot per relationship field. To-one slots distinguish "never set"
/// from "explicitly cleared" at the storage level; reads flatten both to
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier, unique within its type
    pub id: ResourceId,

    /// Concrete resource type of this instance
    pub resource_type: ResourceType,

    /// Attribute payload; never interpreted by the registry or the engine
    #[serde(default)]
    pub attributes: serde_json::Map<String, Value>,

    #[serde(default)]
    to_one_slots: BTreeMap<String, Option<ResourceRef>>,

    #[serde(default)]
    to_many_slots: BTreeMap<String, Vec<ResourceRef>>,
}

impl Resource {
    /// Create an empty resource of the given type
    pub fn new(resource_type: impl Into<ResourceType>, id: impl Into<ResourceId>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            attributes: serde_json::Map::new(),
            to_one_slots: BTreeMap::new(),
            to_many_slots: BTreeMap::new(),
        }
    }

    /// The (type, id) reference identifying this resource
    pub fn reference(&self) -> ResourceRef {
        ResourceRef {
            resource_type: self.resource_type.clone(),
            id: self.id.clone(),
        }
    }

    /// Set an attribute, builder style
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Read an attribute
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Current to-one target of a field, absent when unset or cleared
    pub fn to_one(&self, field_name: &str) -> Option<&ResourceRef> {
        self.to_one_slots
            .get(field_name)
            .and_then(|slot| slot.as_ref())
    }

    /// Current to-many targets of a field, empty when unset
    pub fn to_many(&self, field_name: &str) -> &[ResourceRef] {
        self.to_many_slots
            .get(field_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Set or clear a to-one slot, replacing any prior value
    pub fn set_to_one(&mut self, field_name: impl Into<String>, target: Option<ResourceRef>) {
        self.to_one_slots.insert(field_name.into(), target);
    }

    /// Replace a to-many slot with the supplied list, preserving its order
    pub fn set_to_many(&mut self, field_name: impl Into<String>, targets: Vec<ResourceRef>) {
        self.to_many_slots.insert(field_name.into(), targets);
    }
}

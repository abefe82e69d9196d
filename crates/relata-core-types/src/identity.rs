//! Identity types for resources and their backing implementations
//!
//! Everything the registry routes on is addressed by one of these newtypes.
//! They are deliberately plain strings under the hood: resource type names
//! and ids arrive pre-parsed from the transport layer and are compared, not
//! interpreted.

use serde::{Deserialize, Serialize};

/// Globally unique resource type name (e.g. `tasks`, `projects`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceType(String);

impl ResourceType {
    /// Create a resource type from its canonical name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque identifier of a single resource instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(String);

impl ResourceId {
    /// Create a resource id from its string form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A (type, id) reference to a resource, as carried by relationship
/// mutation requests and stored in relationship slots
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub resource_type: ResourceType,
    pub id: ResourceId,
}

impl ResourceRef {
    /// Create a reference from a type and an id
    pub fn new(resource_type: impl Into<ResourceType>, id: impl Into<ResourceId>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// Identity of the backing implementation behind a resource type
///
/// Registry entries are addressable both by resource type and by the
/// implementation that owns them (typically the repository type name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImplementationId(String);

impl ImplementationId {
    /// Create an implementation id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImplementationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_display_matches_name() {
        let rt = ResourceType::new("tasks");
        assert_eq!(rt.as_str(), "tasks");
        assert_eq!(format!("{}", rt), "tasks");
    }

    #[test]
    fn test_resource_ref_display_is_type_slash_id() {
        let r = ResourceRef::new("projects", "9");
        assert_eq!(format!("{}", r), "projects/9");
    }

    #[test]
    fn test_resource_ref_equality() {
        assert_eq!(ResourceRef::new("tasks", "1"), ResourceRef::new("tasks", "1"));
        assert_ne!(ResourceRef::new("tasks", "1"), ResourceRef::new("tasks", "2"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let r = ResourceRef::new("tasks", "1");
        let json = serde_json::to_string(&r).unwrap();
        let back: ResourceRef = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}

//! Typed request/response surface of the engine
//!
//! Transports pre-parse inbound traffic into [`EngineRequest`] values; the
//! engine never sees wire documents. Relationship mutations arrive as
//! (owner type, owner id, field name, patch value).

use relata_core::model::Resource;
use relata_core::paging::PagingSpec;
use relata_core_types::{ResourceId, ResourceRef, ResourceType};

/// Pre-parsed relationship PATCH value
#[derive(Debug, Clone, PartialEq)]
pub enum RelationshipPatch {
    /// Set (`Some`) or clear (`None`) a to-one relationship
    ToOne(Option<ResourceRef>),
    /// Replace a to-many relationship with the supplied ordered list; an
    /// empty list clears all relations of the field
    ToMany(Vec<ResourceRef>),
}

/// A routed resource request
#[derive(Debug, Clone, PartialEq)]
pub enum EngineRequest {
    /// Read one resource by id
    FindOne {
        resource_type: ResourceType,
        id: ResourceId,
    },
    /// Read a collection; entry-default paging applies when none is given
    FindAll {
        resource_type: ResourceType,
        paging: Option<PagingSpec>,
    },
    /// Create a resource
    Create { resource: Resource },
    /// Update a resource
    Update { resource: Resource },
    /// Delete a resource by id
    Delete {
        resource_type: ResourceType,
        id: ResourceId,
    },
    /// Read the target(s) of a relationship field
    FindRelationship {
        owner_type: ResourceType,
        owner_id: ResourceId,
        field_name: String,
    },
    /// Mutate a relationship field
    PatchRelationship {
        owner_type: ResourceType,
        owner_id: ResourceId,
        field_name: String,
        patch: RelationshipPatch,
    },
}

impl EngineRequest {
    /// Stable operation name for logging
    pub fn op_name(&self) -> &'static str {
        match self {
            EngineRequest::FindOne { .. } => "find_one",
            EngineRequest::FindAll { .. } => "find_all",
            EngineRequest::Create { .. } => "create",
            EngineRequest::Update { .. } => "update",
            EngineRequest::Delete { .. } => "delete",
            EngineRequest::FindRelationship { .. } => "find_relationship",
            EngineRequest::PatchRelationship { .. } => "patch_relationship",
        }
    }
}

/// Result of a routed request
///
/// Relationship mutations respond no-content for set, clear and replace
/// alike; the engine does not echo the mutated relationship back.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineResponse {
    /// A single, possibly absent resource
    One(Option<Resource>),
    /// An ordered resource collection
    Many(Vec<Resource>),
    /// Success without a body
    NoContent,
}

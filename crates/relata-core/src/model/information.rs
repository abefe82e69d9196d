use relata_core_types::{ImplementationId, ResourceType};
use serde::{Deserialize, Serialize};

use crate::errors::{RelataError, Result};

/// Cardinality of a relationship field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// Single optional target (set/clear semantics)
    One,
    /// Ordered target list (full-replacement semantics)
    Many,
}

/// Static metadata of one relationship field
///
/// A relationship is declared either on the owning resource's descriptor or
/// advertised by a separately contributed relationship repository. The
/// declared target-type set is fixed at registry build time; a set with more
/// than one entry describes a polymorphic relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipInformation {
    /// Field name, unique within the owning resource type
    pub field_name: String,

    /// The resource type owning this field
    pub source_type: ResourceType,

    /// Declared target affiliation. Concrete targets may also be strict
    /// descendants of any of these types.
    pub target_types: Vec<ResourceType>,

    /// To-one or to-many
    pub cardinality: Cardinality,

    /// True when the relationship value lives on the owning resource itself
    /// and is served through the owner's primary repository. A directly
    /// resolvable declaration takes precedence over a separately contributed
    /// relationship repository for the same field.
    pub directly_resolvable: bool,
}

impl RelationshipInformation {
    /// Declare a to-one relationship
    pub fn to_one(
        field_name: impl Into<String>,
        source_type: impl Into<ResourceType>,
        target_type: impl Into<ResourceType>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            source_type: source_type.into(),
            target_types: vec![target_type.into()],
            cardinality: Cardinality::One,
            directly_resolvable: false,
        }
    }

    /// Declare a to-many relationship
    pub fn to_many(
        field_name: impl Into<String>,
        source_type: impl Into<ResourceType>,
        target_type: impl Into<ResourceType>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            source_type: source_type.into(),
            target_types: vec![target_type.into()],
            cardinality: Cardinality::Many,
            directly_resolvable: false,
        }
    }

    /// Widen the declared target affiliation (polymorphic relationship)
    pub fn with_target(mut self, target_type: impl Into<ResourceType>) -> Self {
        self.target_types.push(target_type.into());
        self
    }

    /// Mark the relationship as resolvable from the owning resource itself
    pub fn directly_resolvable(mut self) -> Self {
        self.directly_resolvable = true;
        self
    }
}

/// Static metadata of one resource type
///
/// Invariants: a resource type has at most one parent, parent chains are
/// acyclic (checked when the registry is built), and relationship field
/// names are unique within the declaring type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInformation {
    /// Globally unique resource type name
    pub resource_type: ResourceType,

    /// Identity of the backing implementation
    pub implementation_id: ImplementationId,

    /// Optional parent type (single-inheritance chain for polymorphic resources)
    pub parent_type: Option<ResourceType>,

    /// Declared relationship fields, in declaration order
    pub relationships: Vec<RelationshipInformation>,
}

impl ResourceInformation {
    /// Create resource information with no parent and no relationships
    pub fn new(
        resource_type: impl Into<ResourceType>,
        implementation_id: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            implementation_id: ImplementationId::new(implementation_id),
            parent_type: None,
            relationships: Vec::new(),
        }
    }

    /// Set the parent type
    pub fn with_parent(mut self, parent_type: impl Into<ResourceType>) -> Self {
        self.parent_type = Some(parent_type.into());
        self
    }

    /// Append a relationship declaration
    pub fn with_relationship(mut self, relationship: RelationshipInformation) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Look up a declared relationship by field name
    pub fn relationship(&self, field_name: &str) -> Option<&RelationshipInformation> {
        self.relationships
            .iter()
            .find(|r| r.field_name == field_name)
    }

    /// Check the per-descriptor invariants
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRelationshipField` if a field name occurs twice.
    pub fn validate(&self) -> Result<()> {
        for (i, rel) in self.relationships.iter().enumerate() {
            if self.relationships[..i]
                .iter()
                .any(|other| other.field_name == rel.field_name)
            {
                return Err(RelataError::DuplicateRelationshipField {
                    resource_type: self.resource_type.clone(),
                    field_name: rel.field_name.clone(),
                });
            }
        }
        Ok(())
    }
}

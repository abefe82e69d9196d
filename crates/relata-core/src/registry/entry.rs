use std::sync::{Arc, RwLock};

use relata_core_types::{ImplementationId, ResourceType};

use crate::errors::{RelataError, Result};
use crate::model::{RelationshipInformation, ResourceInformation};
use crate::paging::PagingSpec;
use crate::registry::ResourceRegistry;
use crate::repository::{RelationshipRepositoryAdapter, ResourceRepositoryAdapter};

/// How a relationship field is served
#[derive(Debug, Clone)]
pub enum RelationshipBinding {
    /// The value lives on the owning resource and is served through the
    /// owner's primary repository
    Direct,
    /// A separately contributed relationship repository is queried
    Repository(RelationshipRepositoryAdapter),
}

/// One relationship field of a registry entry, bound to its resolution
/// strategy at build time
#[derive(Debug, Clone)]
pub struct RelationshipEntry {
    information: RelationshipInformation,
    binding: RelationshipBinding,
}

impl RelationshipEntry {
    pub(crate) fn direct(information: RelationshipInformation) -> Self {
        Self {
            information,
            binding: RelationshipBinding::Direct,
        }
    }

    pub(crate) fn with_repository(
        information: RelationshipInformation,
        adapter: RelationshipRepositoryAdapter,
    ) -> Self {
        Self {
            information,
            binding: RelationshipBinding::Repository(adapter),
        }
    }

    /// The relationship declaration, target affiliation fixed at build time
    pub fn information(&self) -> &RelationshipInformation {
        &self.information
    }

    /// The bound resolution strategy
    pub fn binding(&self) -> &RelationshipBinding {
        &self.binding
    }

    /// The bound relationship repository adapter, if any
    pub fn repository(&self) -> Option<&RelationshipRepositoryAdapter> {
        match &self.binding {
            RelationshipBinding::Direct => None,
            RelationshipBinding::Repository(adapter) => Some(adapter),
        }
    }
}

/// Frozen registry entry for one resource type
///
/// Exactly one entry exists per resource type. The parent back-reference is
/// stored as a type name and resolved through the registry on demand; it is
/// never an owning pointer.
#[derive(Debug)]
pub struct RegistryEntry {
    resource_information: ResourceInformation,
    primary: Option<ResourceRepositoryAdapter>,
    relationships: Vec<RelationshipEntry>,
    parent_type: RwLock<Option<ResourceType>>,
    paging: PagingSpec,
}

impl RegistryEntry {
    pub(crate) fn new(
        resource_information: ResourceInformation,
        primary: Option<ResourceRepositoryAdapter>,
        relationships: Vec<RelationshipEntry>,
        paging: PagingSpec,
    ) -> Self {
        let parent_type = RwLock::new(resource_information.parent_type.clone());
        Self {
            resource_information,
            primary,
            relationships,
            parent_type,
            paging,
        }
    }

    /// Static information of the resource type this entry serves
    pub fn resource_information(&self) -> &ResourceInformation {
        &self.resource_information
    }

    /// The resource type this entry serves
    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_information.resource_type
    }

    /// Identity of the backing implementation
    pub fn implementation_id(&self) -> &ImplementationId {
        &self.resource_information.implementation_id
    }

    /// True when a primary repository is bound (false for relationship-only
    /// resources reached via navigation)
    pub fn has_resource_repository(&self) -> bool {
        self.primary.is_some()
    }

    /// The primary repository adapter
    ///
    /// # Errors
    /// Returns `MissingPrimaryRepository` for relationship-only entries.
    pub fn resource_repository(&self) -> Result<&ResourceRepositoryAdapter> {
        self.primary
            .as_ref()
            .ok_or_else(|| RelataError::MissingPrimaryRepository {
                resource_type: self.resource_type().clone(),
            })
    }

    /// All relationship entries, in build order
    pub fn relationship_entries(&self) -> &[RelationshipEntry] {
        &self.relationships
    }

    /// The relationship entry of one field
    ///
    /// # Errors
    /// Returns `UnknownRelationship` when the field is not bound.
    pub fn relationship_entry(&self, field_name: &str) -> Result<&RelationshipEntry> {
        self.relationships
            .iter()
            .find(|entry| entry.information.field_name == field_name)
            .ok_or_else(|| RelataError::UnknownRelationship {
                resource_type: self.resource_type().clone(),
                field_name: field_name.to_string(),
            })
    }

    /// Default paging applied to collection reads without an explicit window
    pub fn paging(&self) -> &PagingSpec {
        &self.paging
    }

    /// Current parent type, if any
    pub fn parent_type(&self) -> Option<ResourceType> {
        self.parent_type
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Resolve the parent entry through the registry
    ///
    /// # Errors
    /// Returns `NotRegistered` when a parent type is set but unknown.
    pub fn parent_entry(&self, registry: &ResourceRegistry) -> Result<Option<Arc<RegistryEntry>>> {
        match self.parent_type() {
            Some(parent) => registry.get_entry(&parent).map(Some),
            None => Ok(None),
        }
    }

    /// Reassign the parent type after freeze
    ///
    /// Escape hatch retained for backward compatibility. The registry does
    /// not sequence concurrent callers; anyone invoking this post-freeze is
    /// responsible for external synchronization. Not to be relied on by new
    /// code.
    #[deprecated(note = "entries are frozen; external synchronization is the caller's problem")]
    pub fn reassign_parent(&self, parent_type: Option<ResourceType>) {
        let mut slot = self
            .parent_type
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = parent_type;
    }
}

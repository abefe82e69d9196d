//! Information builders and their combined, first-accept-wins forms
//!
//! Modules contribute builders; at freeze time the combined builder walks
//! its constituents in registration order and delegates to the first one
//! whose `accept` returns true. When none accepts, resolution fails with an
//! unsupported-type configuration error; there is no implicit fallback.

use std::sync::Arc;

use relata_core_types::ResourceType;

use crate::errors::{RelataError, Result};
use crate::model::ResourceInformation;
use crate::repository::RepositoryInstance;

/// Classified repository information: which resource type an instance
/// pertains to, and in which role
#[derive(Debug, Clone)]
pub enum RepositoryInformation {
    /// The instance owns a resource type (primary repository)
    Resource(ResourceInformation),
    /// The instance relates a source type's field to a target type
    Relationship(crate::model::RelationshipInformation),
}

/// Builds resource information for a resource type
pub trait ResourceInformationBuilder: Send + Sync {
    fn accept(&self, resource_type: &ResourceType) -> bool;

    fn build(&self, resource_type: &ResourceType) -> Result<ResourceInformation>;
}

/// Builder wrapping one explicitly declared resource information
///
/// `ModuleContext::add_resource_information` contributes these so that
/// relationship-only resource types can be synthesized at freeze time.
pub struct DeclaredResourceInformation {
    information: ResourceInformation,
}

impl DeclaredResourceInformation {
    pub fn new(information: ResourceInformation) -> Self {
        Self { information }
    }
}

impl ResourceInformationBuilder for DeclaredResourceInformation {
    fn accept(&self, resource_type: &ResourceType) -> bool {
        &self.information.resource_type == resource_type
    }

    fn build(&self, _resource_type: &ResourceType) -> Result<ResourceInformation> {
        Ok(self.information.clone())
    }
}

/// Combines all contributed resource information builders
pub struct CombinedResourceInformationBuilder {
    builders: Vec<Arc<dyn ResourceInformationBuilder>>,
}

impl CombinedResourceInformationBuilder {
    pub fn new(builders: Vec<Arc<dyn ResourceInformationBuilder>>) -> Self {
        Self { builders }
    }

    pub fn accept(&self, resource_type: &ResourceType) -> bool {
        self.builders.iter().any(|b| b.accept(resource_type))
    }

    /// First-accept-wins resolution
    ///
    /// # Errors
    /// Returns `UnsupportedResourceType` when no builder accepts.
    pub fn build(&self, resource_type: &ResourceType) -> Result<ResourceInformation> {
        for builder in &self.builders {
            if builder.accept(resource_type) {
                return builder.build(resource_type);
            }
        }
        Err(RelataError::UnsupportedResourceType {
            resource_type: resource_type.clone(),
        })
    }
}

/// Classifies contributed repository instances
pub trait RepositoryInformationBuilder: Send + Sync {
    fn accept(&self, candidate: &RepositoryInstance) -> bool;

    fn build(&self, candidate: &RepositoryInstance) -> Result<RepositoryInformation>;
}

/// Default classifier for the two built-in repository shapes
///
/// Asks the instance for the information it advertises through its own
/// contract. Registered by `CoreModule`.
pub struct DefaultRepositoryInformationBuilder;

impl RepositoryInformationBuilder for DefaultRepositoryInformationBuilder {
    fn accept(&self, _candidate: &RepositoryInstance) -> bool {
        true
    }

    fn build(&self, candidate: &RepositoryInstance) -> Result<RepositoryInformation> {
        match candidate {
            RepositoryInstance::Resource(repository) => {
                Ok(RepositoryInformation::Resource(repository.resource_information()))
            }
            RepositoryInstance::Relationship(repository) => Ok(
                RepositoryInformation::Relationship(repository.relationship_information()),
            ),
        }
    }
}

/// Combines all contributed repository information builders
pub struct CombinedRepositoryInformationBuilder {
    builders: Vec<Arc<dyn RepositoryInformationBuilder>>,
}

impl CombinedRepositoryInformationBuilder {
    pub fn new(builders: Vec<Arc<dyn RepositoryInformationBuilder>>) -> Self {
        Self { builders }
    }

    pub fn accept(&self, candidate: &RepositoryInstance) -> bool {
        self.builders.iter().any(|b| b.accept(candidate))
    }

    /// First-accept-wins resolution
    ///
    /// # Errors
    /// Returns `UnsupportedRepository` naming the contributing module when
    /// no builder accepts.
    pub fn build(
        &self,
        candidate: &RepositoryInstance,
        contributed_by: &str,
    ) -> Result<RepositoryInformation> {
        for builder in &self.builders {
            if builder.accept(candidate) {
                return builder.build(candidate);
            }
        }
        Err(RelataError::UnsupportedRepository {
            module: contributed_by.to_string(),
        })
    }
}

/// Source of resource types that must exist in the registry even without
/// any repository contribution
pub trait ResourceLookup: Send + Sync {
    fn resource_types(&self) -> Vec<ResourceType>;
}

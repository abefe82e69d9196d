//! Repository contracts, capability tags and cross-cutting adapters
//!
//! Backing repositories implement one of two shapes: a resource repository
//! owns exactly one resource type, a relationship repository relates one
//! source type's field to a target type. Instances are contributed to the
//! module registry in their tagged form ([`RepositoryInstance`]) so the
//! decorator chain and the registry builder can test shape without
//! open-ended type inspection.
//!
//! Adapters wrap the (possibly decorated) repository together with the
//! frozen filter list; every call on an adapter runs the contributed
//! [`RepositoryFilter`] hooks in registration order.

use std::sync::Arc;

use relata_core_types::{ResourceId, ResourceType};

use crate::errors::{RelataError, Result};
use crate::model::{Cardinality, RelationshipInformation, Resource, ResourceInformation};
use crate::paging::PagingSpec;
use crate::registry::RegistryHandle;

/// Capability for repositories that need to look up sibling resource types
///
/// The injected handle is non-owning: the repository may resolve entries
/// through it but does not keep the registry alive.
pub trait RegistryAware: Send + Sync {
    fn set_resource_registry(&self, registry: RegistryHandle);
}

/// A repository owning exactly one resource type
pub trait ResourceRepository: Send + Sync {
    /// Static information about the owned resource type
    fn resource_information(&self) -> ResourceInformation;

    /// Look up one resource by id
    ///
    /// # Errors
    /// Returns `ResourceNotFound` when the id does not resolve.
    fn find_one(&self, id: &ResourceId) -> Result<Resource>;

    /// List resources within the given paging window, in repository order
    fn find_all(&self, paging: &PagingSpec) -> Result<Vec<Resource>>;

    /// Insert or update a resource, returning the stored form
    fn save(&self, resource: Resource) -> Result<Resource>;

    /// Remove a resource by id
    ///
    /// # Errors
    /// Returns `ResourceNotFound` when the id does not resolve.
    fn delete(&self, id: &ResourceId) -> Result<()>;

    /// Registry-aware capability accessor; default is not aware
    fn as_registry_aware(&self) -> Option<&dyn RegistryAware> {
        None
    }
}

/// A repository relating one source type's field to a target type
pub trait RelationshipRepository: Send + Sync {
    /// Owning (source) resource type of the related field
    fn source_type(&self) -> ResourceType;

    /// The related field name on the source type
    fn field_name(&self) -> String;

    /// Declared target type of the field
    fn target_type(&self) -> ResourceType;

    /// Declared cardinality of the field
    fn cardinality(&self) -> Cardinality;

    /// Resolve the single target of a to-one field, absent when unset
    fn find_one_target(&self, owner_id: &ResourceId, field_name: &str)
        -> Result<Option<Resource>>;

    /// Resolve the ordered targets of a to-many field
    fn find_many_targets(&self, owner_id: &ResourceId, field_name: &str) -> Result<Vec<Resource>>;

    /// Set or clear a to-one relation
    fn set_relation(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        target: Option<ResourceId>,
    ) -> Result<()>;

    /// Replace all relations of a field with the supplied ordered list
    fn set_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()>;

    /// Append relations in list order
    fn add_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()>;

    /// Remove the named relations; absent ids are ignored
    fn remove_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()>;

    /// Registry-aware capability accessor; default is not aware
    fn as_registry_aware(&self) -> Option<&dyn RegistryAware> {
        None
    }

    /// The relationship declaration this repository advertises
    fn relationship_information(&self) -> RelationshipInformation {
        RelationshipInformation {
            field_name: self.field_name(),
            source_type: self.source_type(),
            target_types: vec![self.target_type()],
            cardinality: self.cardinality(),
            directly_resolvable: false,
        }
    }
}

/// A contributed repository instance, tagged by shape
#[derive(Clone)]
pub enum RepositoryInstance {
    Resource(Arc<dyn ResourceRepository>),
    Relationship(Arc<dyn RelationshipRepository>),
}

impl std::fmt::Debug for RepositoryInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryInstance::Resource(repo) => f
                .debug_tuple("Resource")
                .field(&repo.resource_information().resource_type)
                .finish(),
            RepositoryInstance::Relationship(repo) => f
                .debug_tuple("Relationship")
                .field(&repo.source_type())
                .field(&repo.field_name())
                .finish(),
        }
    }
}

/// Opaque lookup of additional repository instances, queried once at freeze
pub trait ServiceDiscovery: Send + Sync {
    fn discover_repositories(&self) -> Vec<RepositoryInstance>;
}

// ========== Repository Filters ==========

/// The repository operation a filter is observing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryOperation {
    FindOne,
    FindAll,
    Save,
    Delete,
    FindTargets,
    SetRelation,
    SetRelations,
    AddRelations,
    RemoveRelations,
}

/// Description of one repository call, handed to filters
#[derive(Debug)]
pub struct RepositoryCall<'a> {
    pub resource_type: &'a ResourceType,
    pub operation: RepositoryOperation,
    pub id: Option<&'a ResourceId>,
    pub field_name: Option<&'a str>,
}

/// Ordered cross-cutting hook around every adapter call
///
/// `before` may veto the call by returning an error; a veto short-circuits
/// both the repository call and the remaining filters. `after` observes the
/// outcome and must not fail.
pub trait RepositoryFilter: Send + Sync {
    fn before(&self, _call: &RepositoryCall<'_>) -> Result<()> {
        Ok(())
    }

    fn after(&self, _call: &RepositoryCall<'_>, _error: Option<&RelataError>) {}
}

// ========== Adapters ==========

/// Filter-applying facade over a (decorated) resource repository
///
/// This is what registry entries hand out; the raw repository is never
/// called directly by the engine.
#[derive(Clone)]
pub struct ResourceRepositoryAdapter {
    resource_type: ResourceType,
    repository: Arc<dyn ResourceRepository>,
    filters: Arc<[Arc<dyn RepositoryFilter>]>,
}

impl ResourceRepositoryAdapter {
    pub(crate) fn new(
        repository: Arc<dyn ResourceRepository>,
        filters: Arc<[Arc<dyn RepositoryFilter>]>,
    ) -> Self {
        let resource_type = repository.resource_information().resource_type;
        Self {
            resource_type,
            repository,
            filters,
        }
    }

    /// The resource type this adapter serves
    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    /// The decorated repository behind this adapter
    pub fn repository(&self) -> &Arc<dyn ResourceRepository> {
        &self.repository
    }

    pub fn find_one(&self, id: &ResourceId) -> Result<Resource> {
        let call = RepositoryCall {
            resource_type: &self.resource_type,
            operation: RepositoryOperation::FindOne,
            id: Some(id),
            field_name: None,
        };
        self.invoke(&call, || self.repository.find_one(id))
    }

    pub fn find_all(&self, paging: &PagingSpec) -> Result<Vec<Resource>> {
        let call = RepositoryCall {
            resource_type: &self.resource_type,
            operation: RepositoryOperation::FindAll,
            id: None,
            field_name: None,
        };
        self.invoke(&call, || self.repository.find_all(paging))
    }

    pub fn save(&self, resource: Resource) -> Result<Resource> {
        let id = resource.id.clone();
        let call = RepositoryCall {
            resource_type: &self.resource_type,
            operation: RepositoryOperation::Save,
            id: Some(&id),
            field_name: None,
        };
        self.invoke(&call, || self.repository.save(resource))
    }

    pub fn delete(&self, id: &ResourceId) -> Result<()> {
        let call = RepositoryCall {
            resource_type: &self.resource_type,
            operation: RepositoryOperation::Delete,
            id: Some(id),
            field_name: None,
        };
        self.invoke(&call, || self.repository.delete(id))
    }

    fn invoke<T>(
        &self,
        call: &RepositoryCall<'_>,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        for filter in self.filters.iter() {
            filter.before(call)?;
        }
        let result = f();
        for filter in self.filters.iter() {
            filter.after(call, result.as_ref().err());
        }
        result
    }
}

impl std::fmt::Debug for ResourceRepositoryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRepositoryAdapter")
            .field("resource_type", &self.resource_type)
            .finish()
    }
}

/// Filter-applying facade over a (decorated) relationship repository
#[derive(Clone)]
pub struct RelationshipRepositoryAdapter {
    source_type: ResourceType,
    repository: Arc<dyn RelationshipRepository>,
    filters: Arc<[Arc<dyn RepositoryFilter>]>,
}

impl RelationshipRepositoryAdapter {
    pub(crate) fn new(
        repository: Arc<dyn RelationshipRepository>,
        filters: Arc<[Arc<dyn RepositoryFilter>]>,
    ) -> Self {
        let source_type = repository.source_type();
        Self {
            source_type,
            repository,
            filters,
        }
    }

    /// The decorated repository behind this adapter
    pub fn repository(&self) -> &Arc<dyn RelationshipRepository> {
        &self.repository
    }

    pub fn find_one_target(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
    ) -> Result<Option<Resource>> {
        let call = RepositoryCall {
            resource_type: &self.source_type,
            operation: RepositoryOperation::FindTargets,
            id: Some(owner_id),
            field_name: Some(field_name),
        };
        self.invoke(&call, || self.repository.find_one_target(owner_id, field_name))
    }

    pub fn find_many_targets(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
    ) -> Result<Vec<Resource>> {
        let call = RepositoryCall {
            resource_type: &self.source_type,
            operation: RepositoryOperation::FindTargets,
            id: Some(owner_id),
            field_name: Some(field_name),
        };
        self.invoke(&call, || {
            self.repository.find_many_targets(owner_id, field_name)
        })
    }

    pub fn set_relation(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        target: Option<ResourceId>,
    ) -> Result<()> {
        let call = RepositoryCall {
            resource_type: &self.source_type,
            operation: RepositoryOperation::SetRelation,
            id: Some(owner_id),
            field_name: Some(field_name),
        };
        self.invoke(&call, || {
            self.repository.set_relation(owner_id, field_name, target)
        })
    }

    pub fn set_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        let call = RepositoryCall {
            resource_type: &self.source_type,
            operation: RepositoryOperation::SetRelations,
            id: Some(owner_id),
            field_name: Some(field_name),
        };
        self.invoke(&call, || {
            self.repository.set_relations(owner_id, field_name, targets)
        })
    }

    pub fn add_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        let call = RepositoryCall {
            resource_type: &self.source_type,
            operation: RepositoryOperation::AddRelations,
            id: Some(owner_id),
            field_name: Some(field_name),
        };
        self.invoke(&call, || {
            self.repository.add_relations(owner_id, field_name, targets)
        })
    }

    pub fn remove_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        let call = RepositoryCall {
            resource_type: &self.source_type,
            operation: RepositoryOperation::RemoveRelations,
            id: Some(owner_id),
            field_name: Some(field_name),
        };
        self.invoke(&call, || {
            self.repository.remove_relations(owner_id, field_name, targets)
        })
    }

    fn invoke<T>(
        &self,
        call: &RepositoryCall<'_>,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        for filter in self.filters.iter() {
            filter.before(call)?;
        }
        let result = f();
        for filter in self.filters.iter() {
            filter.after(call, result.as_ref().err());
        }
        result
    }
}

impl std::fmt::Debug for RelationshipRepositoryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipRepositoryAdapter")
            .field("source_type", &self.source_type)
            .finish()
    }
}

use std::collections::BTreeMap;
use std::sync::RwLock;

use relata_core::errors::{RelataError, Result};
use relata_core::model::{Resource, ResourceInformation};
use relata_core::paging::PagingSpec;
use relata_core::repository::ResourceRepository;
use relata_core_types::ResourceId;

/// In-memory resource repository over a `BTreeMap`
///
/// The map keeps ids ordered, so `find_all` is deterministic. Interior
/// locking makes the repository shareable behind an `Arc`; lock scope is a
/// single operation, consistent with the engine's no-cross-call-atomicity
/// model.
pub struct InMemoryResourceRepository {
    information: ResourceInformation,
    store: RwLock<BTreeMap<ResourceId, Resource>>,
}

impl InMemoryResourceRepository {
    /// Create an empty repository serving the described resource type
    pub fn new(information: ResourceInformation) -> Self {
        Self {
            information,
            store: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a repository pre-seeded with resources
    pub fn with_resources(
        information: ResourceInformation,
        resources: impl IntoIterator<Item = Resource>,
    ) -> Self {
        let repository = Self::new(information);
        {
            let mut store = repository
                .store
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for resource in resources {
                store.insert(resource.id.clone(), resource);
            }
        }
        repository
    }

    /// Number of stored resources
    pub fn len(&self) -> usize {
        self.store
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceRepository for InMemoryResourceRepository {
    fn resource_information(&self) -> ResourceInformation {
        self.information.clone()
    }

    fn find_one(&self, id: &ResourceId) -> Result<Resource> {
        self.store
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| RelataError::ResourceNotFound {
                resource_type: self.information.resource_type.clone(),
                id: id.clone(),
            })
    }

    fn find_all(&self, paging: &PagingSpec) -> Result<Vec<Resource>> {
        let resources: Vec<Resource> = self
            .store
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .cloned()
            .collect();
        Ok(paging.apply(resources))
    }

    fn save(&self, resource: Resource) -> Result<Resource> {
        self.store
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(resource.id.clone(), resource.clone());
        Ok(resource)
    }

    fn delete(&self, id: &ResourceId) -> Result<()> {
        self.store
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RelataError::ResourceNotFound {
                resource_type: self.information.resource_type.clone(),
                id: id.clone(),
            })
    }
}

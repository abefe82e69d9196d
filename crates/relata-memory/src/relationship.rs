use std::collections::BTreeMap;
use std::sync::{OnceLock, RwLock};

use relata_core::errors::{RelataError, Result};
use relata_core::model::{Cardinality, Resource};
use relata_core::registry::RegistryHandle;
use relata_core::repository::{RegistryAware, RelationshipRepository};
use relata_core_types::{ResourceId, ResourceType};

/// In-memory relationship repository for one (source, field, target) binding
///
/// Stores per-owner ordered target-id lists. Target entities are
/// materialized through the frozen registry, so the repository is
/// registry-aware: the decorator chain injects a non-owning handle after
/// decoration completes.
pub struct InMemoryRelationshipRepository {
    source_type: ResourceType,
    field_name: String,
    target_type: ResourceType,
    cardinality: Cardinality,
    relations: RwLock<BTreeMap<ResourceId, Vec<ResourceId>>>,
    registry: OnceLock<RegistryHandle>,
}

impl InMemoryRelationshipRepository {
    /// Create a to-one relationship repository
    pub fn to_one(
        source_type: impl Into<ResourceType>,
        field_name: impl Into<String>,
        target_type: impl Into<ResourceType>,
    ) -> Self {
        Self::new(source_type, field_name, target_type, Cardinality::One)
    }

    /// Create a to-many relationship repository
    pub fn to_many(
        source_type: impl Into<ResourceType>,
        field_name: impl Into<String>,
        target_type: impl Into<ResourceType>,
    ) -> Self {
        Self::new(source_type, field_name, target_type, Cardinality::Many)
    }

    fn new(
        source_type: impl Into<ResourceType>,
        field_name: impl Into<String>,
        target_type: impl Into<ResourceType>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            source_type: source_type.into(),
            field_name: field_name.into(),
            target_type: target_type.into(),
            cardinality,
            relations: RwLock::new(BTreeMap::new()),
            registry: OnceLock::new(),
        }
    }

    /// Raw target ids of one owner, in relation order
    pub fn relation_ids(&self, owner_id: &ResourceId) -> Vec<ResourceId> {
        self.relations
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(owner_id)
            .cloned()
            .unwrap_or_default()
    }

    fn check_field(&self, field_name: &str) -> Result<()> {
        if field_name != self.field_name {
            return Err(RelataError::UnknownRelationship {
                resource_type: self.source_type.clone(),
                field_name: field_name.to_string(),
            });
        }
        Ok(())
    }

    fn materialize(&self, target_id: &ResourceId) -> Result<Resource> {
        let handle = self
            .registry
            .get()
            .ok_or_else(|| RelataError::NotInitialized {
                what: "registry handle".to_string(),
            })?;
        let registry = handle.get()?;
        let entry = registry.get_entry(&self.target_type)?;
        entry.resource_repository()?.find_one(target_id)
    }
}

impl RegistryAware for InMemoryRelationshipRepository {
    fn set_resource_registry(&self, registry: RegistryHandle) {
        // Injection happens once at freeze; repeated injection is a no-op
        let _ = self.registry.set(registry);
    }
}

impl RelationshipRepository for InMemoryRelationshipRepository {
    fn source_type(&self) -> ResourceType {
        self.source_type.clone()
    }

    fn field_name(&self) -> String {
        self.field_name.clone()
    }

    fn target_type(&self) -> ResourceType {
        self.target_type.clone()
    }

    fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    fn find_one_target(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
    ) -> Result<Option<Resource>> {
        self.check_field(field_name)?;
        let first = self.relation_ids(owner_id).into_iter().next();
        match first {
            Some(target_id) => self.materialize(&target_id).map(Some),
            None => Ok(None),
        }
    }

    fn find_many_targets(&self, owner_id: &ResourceId, field_name: &str) -> Result<Vec<Resource>> {
        self.check_field(field_name)?;
        self.relation_ids(owner_id)
            .iter()
            .map(|target_id| self.materialize(target_id))
            .collect()
    }

    fn set_relation(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        target: Option<ResourceId>,
    ) -> Result<()> {
        self.check_field(field_name)?;
        let mut relations = self
            .relations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match target {
            Some(target_id) => {
                relations.insert(owner_id.clone(), vec![target_id]);
            }
            None => {
                relations.remove(owner_id);
            }
        }
        Ok(())
    }

    fn set_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        self.check_field(field_name)?;
        self.relations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(owner_id.clone(), targets);
        Ok(())
    }

    fn add_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        self.check_field(field_name)?;
        self.relations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(owner_id.clone())
            .or_default()
            .extend(targets);
        Ok(())
    }

    fn remove_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        self.check_field(field_name)?;
        let mut relations = self
            .relations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(current) = relations.get_mut(owner_id) {
            current.retain(|id| !targets.contains(id));
        }
        Ok(())
    }

    fn as_registry_aware(&self) -> Option<&dyn RegistryAware> {
        Some(self)
    }
}

use std::collections::BTreeMap;
use std::sync::RwLock;

use relata_core::errors::{RelataError, Result};
use relata_core::model::{Cardinality, Resource, ResourceInformation};
use relata_core::module::{Module, ModuleContext};
use relata_core::paging::PagingSpec;
use relata_core::repository::{RelationshipRepository, ResourceRepository};
use relata_core_types::{ResourceId, ResourceType};

/// Module that contributes whatever the test hands it
#[allow(dead_code)]
pub struct SetupModule {
    name: &'static str,
    setup_fn: Box<dyn Fn(&mut ModuleContext<'_>)>,
}

#[allow(dead_code)]
pub fn module(
    name: &'static str,
    setup_fn: impl Fn(&mut ModuleContext<'_>) + 'static,
) -> SetupModule {
    SetupModule {
        name,
        setup_fn: Box::new(setup_fn),
    }
}

impl Module for SetupModule {
    fn module_name(&self) -> &'static str {
        self.name
    }

    fn setup(&self, context: &mut ModuleContext<'_>) -> Result<()> {
        (self.setup_fn)(context);
        Ok(())
    }
}

/// Minimal in-memory resource repository for registry tests
#[allow(dead_code)]
pub struct TestResourceRepository {
    information: ResourceInformation,
    store: RwLock<BTreeMap<ResourceId, Resource>>,
}

#[allow(dead_code)]
impl TestResourceRepository {
    pub fn new(information: ResourceInformation) -> Self {
        Self {
            information,
            store: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn seeded(information: ResourceInformation, resources: Vec<Resource>) -> Self {
        let repository = Self::new(information);
        {
            let mut store = repository.store.write().unwrap();
            for resource in resources {
                store.insert(resource.id.clone(), resource);
            }
        }
        repository
    }
}

impl ResourceRepository for TestResourceRepository {
    fn resource_information(&self) -> ResourceInformation {
        self.information.clone()
    }

    fn find_one(&self, id: &ResourceId) -> Result<Resource> {
        self.store.read().unwrap().get(id).cloned().ok_or_else(|| {
            RelataError::ResourceNotFound {
                resource_type: self.information.resource_type.clone(),
                id: id.clone(),
            }
        })
    }

    fn find_all(&self, paging: &PagingSpec) -> Result<Vec<Resource>> {
        let resources: Vec<Resource> = self.store.read().unwrap().values().cloned().collect();
        Ok(paging.apply(resources))
    }

    fn save(&self, resource: Resource) -> Result<Resource> {
        self.store
            .write()
            .unwrap()
            .insert(resource.id.clone(), resource.clone());
        Ok(resource)
    }

    fn delete(&self, id: &ResourceId) -> Result<()> {
        self.store.write().unwrap().remove(id).map(|_| ()).ok_or_else(|| {
            RelataError::ResourceNotFound {
                resource_type: self.information.resource_type.clone(),
                id: id.clone(),
            }
        })
    }
}

/// Relationship repository stub advertising one (source, field, target) binding
///
/// Stores relation ids but never materializes targets; registry tests only
/// exercise classification, binding and decoration.
#[allow(dead_code)]
pub struct TestRelationshipRepository {
    source_type: ResourceType,
    field_name: String,
    target_type: ResourceType,
    cardinality: Cardinality,
    relations: RwLock<BTreeMap<ResourceId, Vec<ResourceId>>>,
}

#[allow(dead_code)]
impl TestRelationshipRepository {
    pub fn new(
        source_type: &str,
        field_name: &str,
        target_type: &str,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            source_type: ResourceType::new(source_type),
            field_name: field_name.to_string(),
            target_type: ResourceType::new(target_type),
            cardinality,
            relations: RwLock::new(BTreeMap::new()),
        }
    }
}

impl RelationshipRepository for TestRelationshipRepository {
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
        _owner_id: &ResourceId,
        _field_name: &str,
    ) -> Result<Option<Resource>> {
        Ok(None)
    }

    fn find_many_targets(
        &self,
        _owner_id: &ResourceId,
        _field_name: &str,
    ) -> Result<Vec<Resource>> {
        Ok(Vec::new())
    }

    fn set_relation(
        &self,
        owner_id: &ResourceId,
        _field_name: &str,
        target: Option<ResourceId>,
    ) -> Result<()> {
        let mut relations = self.relations.write().unwrap();
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
        _field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        self.relations.write().unwrap().insert(owner_id.clone(), targets);
        Ok(())
    }

    fn add_relations(
        &self,
        owner_id: &ResourceId,
        _field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        self.relations
            .write()
            .unwrap()
            .entry(owner_id.clone())
            .or_default()
            .extend(targets);
        Ok(())
    }

    fn remove_relations(
        &self,
        owner_id: &ResourceId,
        _field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        let mut relations = self.relations.write().unwrap();
        if let Some(current) = relations.get_mut(owner_id) {
            current.retain(|id| !targets.contains(id));
        }
        Ok(())
    }
}

/// `tasks` descriptor with a to-one `project` relationship
#[allow(dead_code)]
pub fn tasks_information() -> ResourceInformation {
    ResourceInformation::new("tasks", "tasks-repository").with_relationship(
        relata_core::model::RelationshipInformation::to_one("project", "tasks", "projects"),
    )
}

/// Plain `projects` descriptor
#[allow(dead_code)]
pub fn projects_information() -> ResourceInformation {
    ResourceInformation::new("projects", "projects-repository")
}

/// A resource with a `name` attribute
#[allow(dead_code)]
pub fn resource(resource_type: &str, id: &str, name: &str) -> Resource {
    Resource::new(resource_type, id).with_attribute("name", serde_json::json!(name))
}

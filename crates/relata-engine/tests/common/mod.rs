use std::sync::Arc;

use relata_core::errors::{RelataError, Result};
use relata_core::model::{Cardinality, RelationshipInformation, Resource, ResourceInformation};
use relata_core::module::{Module, ModuleContext};
use relata_core::repository::{RegistryAware, RelationshipRepository};
use relata_core::security::AllowAllSecurityProvider;
use relata_core::{CoreModule, ModuleRegistry};
use relata_core_types::{ResourceId, ResourceRef, ResourceType};
use relata_engine::{EngineRequest, EngineResponse, RelationshipPatch, RequestDispatcher};
use relata_memory::{InMemoryRelationshipRepository, InMemoryResourceRepository};

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

/// A resource with a `name` attribute
#[allow(dead_code)]
pub fn resource(resource_type: &str, id: &str, name: &str) -> Resource {
    Resource::new(resource_type, id).with_attribute("name", serde_json::json!(name))
}

#[allow(dead_code)]
pub fn reference(resource_type: &str, id: &str) -> ResourceRef {
    ResourceRef::new(resource_type, id)
}

/// `tasks` with a to-one `project` field expecting a relationship repository
#[allow(dead_code)]
pub fn tasks_information() -> ResourceInformation {
    ResourceInformation::new("tasks", "tasks-repository").with_relationship(
        RelationshipInformation::to_one("project", "tasks", "projects"),
    )
}

/// `tasks` with a directly resolvable to-one `project` field
#[allow(dead_code)]
pub fn tasks_information_direct() -> ResourceInformation {
    ResourceInformation::new("tasks", "tasks-repository").with_relationship(
        RelationshipInformation::to_one("project", "tasks", "projects").directly_resolvable(),
    )
}

#[allow(dead_code)]
pub fn projects_information() -> ResourceInformation {
    ResourceInformation::new("projects", "projects-repository")
}

/// `users` with a to-many `assignedProjects` field
#[allow(dead_code)]
pub fn users_information() -> ResourceInformation {
    ResourceInformation::new("users", "users-repository").with_relationship(
        RelationshipInformation::to_many("assignedProjects", "users", "projects"),
    )
}

/// Initialized module registry plus the dispatcher routing against it
pub struct Scenario {
    #[allow(dead_code)]
    pub modules: ModuleRegistry,
    pub dispatcher: RequestDispatcher,
}

#[allow(dead_code)]
pub fn scenario(setup_fn: impl Fn(&mut ModuleContext<'_>) + 'static) -> Scenario {
    let mut modules = ModuleRegistry::new();
    modules.add_module(&CoreModule).unwrap();
    let setup = module("scenario", move |context| {
        context.add_security_provider(Arc::new(AllowAllSecurityProvider));
        setup_fn(context);
    });
    modules.add_module(&setup).unwrap();
    modules.init().unwrap();
    let dispatcher = RequestDispatcher::new(&modules).unwrap();
    Scenario {
        modules,
        dispatcher,
    }
}

/// tasks(1) and projects(9, 3) with a to-one relationship repository
#[allow(dead_code)]
pub fn to_one_scenario() -> (Scenario, Arc<InMemoryRelationshipRepository>) {
    let relationship = Arc::new(InMemoryRelationshipRepository::to_one(
        "tasks", "project", "projects",
    ));
    let contributed = relationship.clone();
    let scenario = scenario(move |context| {
        context.add_resource_repository(Arc::new(InMemoryResourceRepository::with_resources(
            tasks_information(),
            [resource("tasks", "1", "sample task")],
        )));
        context.add_resource_repository(Arc::new(InMemoryResourceRepository::with_resources(
            projects_information(),
            [
                resource("projects", "9", "sample project"),
                resource("projects", "3", "other project"),
            ],
        )));
        context.add_relationship_repository(contributed.clone());
    });
    (scenario, relationship)
}

/// users(1) and projects(5, 6, 7) with a to-many relationship repository
#[allow(dead_code)]
pub fn to_many_scenario() -> (Scenario, Arc<InMemoryRelationshipRepository>) {
    let relationship = Arc::new(InMemoryRelationshipRepository::to_many(
        "users",
        "assignedProjects",
        "projects",
    ));
    let contributed = relationship.clone();
    let scenario = scenario(move |context| {
        context.add_resource_repository(Arc::new(InMemoryResourceRepository::with_resources(
            users_information(),
            [resource("users", "1", "sample user")],
        )));
        context.add_resource_repository(Arc::new(InMemoryResourceRepository::with_resources(
            projects_information(),
            [
                resource("projects", "5", "five"),
                resource("projects", "6", "six"),
                resource("projects", "7", "seven"),
            ],
        )));
        context.add_relationship_repository(contributed.clone());
    });
    (scenario, relationship)
}

/// Read a relationship and flatten the response into references
#[allow(dead_code)]
pub fn read_relationship(
    scenario: &Scenario,
    owner_type: &str,
    owner_id: &str,
    field_name: &str,
) -> EngineResponse {
    scenario
        .dispatcher
        .dispatch(EngineRequest::FindRelationship {
            owner_type: ResourceType::new(owner_type),
            owner_id: ResourceId::new(owner_id),
            field_name: field_name.to_string(),
        })
        .unwrap()
}

#[allow(dead_code)]
pub fn patch_relationship(
    scenario: &Scenario,
    owner_type: &str,
    owner_id: &str,
    field_name: &str,
    patch: RelationshipPatch,
) -> Result<EngineResponse> {
    scenario.dispatcher.dispatch(EngineRequest::PatchRelationship {
        owner_type: ResourceType::new(owner_type),
        owner_id: ResourceId::new(owner_id),
        field_name: field_name.to_string(),
        patch,
    })
}

/// Relationship repository whose add primitive fails for one poisoned target
#[allow(dead_code)]
pub struct FailingAddRepository {
    inner: InMemoryRelationshipRepository,
    poison: ResourceId,
}

#[allow(dead_code)]
impl FailingAddRepository {
    pub fn to_many(
        source_type: &str,
        field_name: &str,
        target_type: &str,
        poison: &str,
    ) -> Self {
        Self {
            inner: InMemoryRelationshipRepository::to_many(source_type, field_name, target_type),
            poison: ResourceId::new(poison),
        }
    }

    pub fn relation_ids(&self, owner_id: &ResourceId) -> Vec<ResourceId> {
        self.inner.relation_ids(owner_id)
    }
}

impl RelationshipRepository for FailingAddRepository {
    fn source_type(&self) -> ResourceType {
        self.inner.source_type()
    }

    fn field_name(&self) -> String {
        self.inner.field_name()
    }

    fn target_type(&self) -> ResourceType {
        self.inner.target_type()
    }

    fn cardinality(&self) -> Cardinality {
        self.inner.cardinality()
    }

    fn find_one_target(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
    ) -> Result<Option<Resource>> {
        self.inner.find_one_target(owner_id, field_name)
    }

    fn find_many_targets(&self, owner_id: &ResourceId, field_name: &str) -> Result<Vec<Resource>> {
        self.inner.find_many_targets(owner_id, field_name)
    }

    fn set_relation(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        target: Option<ResourceId>,
    ) -> Result<()> {
        self.inner.set_relation(owner_id, field_name, target)
    }

    fn set_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        self.inner.set_relations(owner_id, field_name, targets)
    }

    fn add_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        if targets.contains(&self.poison) {
            return Err(RelataError::Repository {
                message: format!("refusing to relate {}", self.poison),
            });
        }
        self.inner.add_relations(owner_id, field_name, targets)
    }

    fn remove_relations(
        &self,
        owner_id: &ResourceId,
        field_name: &str,
        targets: Vec<ResourceId>,
    ) -> Result<()> {
        self.inner.remove_relations(owner_id, field_name, targets)
    }

    fn as_registry_aware(&self) -> Option<&dyn RegistryAware> {
        self.inner.as_registry_aware()
    }
}

mod common;

use std::sync::Arc;

use common::{
    patch_relationship, projects_information, read_relationship, reference, resource, scenario,
    tasks_information_direct, to_one_scenario,
};
use relata_core::errors::RelataError;
use relata_core_types::{ResourceId, ResourceType};
use relata_engine::{EngineRequest, EngineResponse, RelationshipPatch};
use relata_memory::InMemoryResourceRepository;

// ===== REPOSITORY-BOUND TO-ONE TESTS =====

#[test]
fn test_patch_sets_to_one_relationship() {
    let (scenario, relationship) = to_one_scenario();

    let response = patch_relationship(
        &scenario,
        "tasks",
        "1",
        "project",
        RelationshipPatch::ToOne(Some(reference("projects", "9"))),
    )
    .unwrap();
    assert_eq!(response, EngineResponse::NoContent);

    match read_relationship(&scenario, "tasks", "1", "project") {
        EngineResponse::One(Some(target)) => {
            assert_eq!(target.id, ResourceId::new("9"));
            assert_eq!(target.resource_type, ResourceType::new("projects"));
        }
        other => panic!("expected the set target, got {:?}", other),
    }
    assert_eq!(
        relationship.relation_ids(&ResourceId::new("1")),
        vec![ResourceId::new("9")]
    );
}

#[test]
fn test_patch_replaces_prior_to_one_value() {
    let (scenario, relationship) = to_one_scenario();

    patch_relationship(
        &scenario,
        "tasks",
        "1",
        "project",
        RelationshipPatch::ToOne(Some(reference("projects", "9"))),
    )
    .unwrap();
    patch_relationship(
        &scenario,
        "tasks",
        "1",
        "project",
        RelationshipPatch::ToOne(Some(reference("projects", "3"))),
    )
    .unwrap();

    assert_eq!(
        relationship.relation_ids(&ResourceId::new("1")),
        vec![ResourceId::new("3")]
    );
}

#[test]
fn test_patch_null_clears_to_one_relationship() {
    let (scenario, relationship) = to_one_scenario();

    patch_relationship(
        &scenario,
        "tasks",
        "1",
        "project",
        RelationshipPatch::ToOne(Some(reference("projects", "9"))),
    )
    .unwrap();

    let response = patch_relationship(
        &scenario,
        "tasks",
        "1",
        "project",
        RelationshipPatch::ToOne(None),
    )
    .unwrap();
    // Clear responds no-content, exactly like set
    assert_eq!(response, EngineResponse::NoContent);

    assert_eq!(
        read_relationship(&scenario, "tasks", "1", "project"),
        EngineResponse::One(None)
    );
    assert!(relationship.relation_ids(&ResourceId::new("1")).is_empty());
}

#[test]
fn test_patch_unknown_owner_is_not_found() {
    let (scenario, _relationship) = to_one_scenario();

    let result = patch_relationship(
        &scenario,
        "tasks",
        "77",
        "project",
        RelationshipPatch::ToOne(Some(reference("projects", "9"))),
    );
    match result {
        Err(RelataError::ResourceNotFound { resource_type, id }) => {
            assert_eq!(resource_type.as_str(), "tasks");
            assert_eq!(id.as_str(), "77");
        }
        other => panic!("expected ResourceNotFound, got {:?}", other),
    }
}

// ===== DIRECTLY RESOLVABLE TO-ONE TESTS =====

#[test]
fn test_direct_binding_set_and_clear_persist_through_owner() {
    let scenario = scenario(|context| {
        context.add_resource_repository(Arc::new(InMemoryResourceRepository::with_resources(
            tasks_information_direct(),
            [resource("tasks", "1", "sample task")],
        )));
        context.add_resource_repository(Arc::new(InMemoryResourceRepository::with_resources(
            projects_information(),
            [resource("projects", "9", "sample project")],
        )));
    });

    patch_relationship(
        &scenario,
        "tasks",
        "1",
        "project",
        RelationshipPatch::ToOne(Some(reference("projects", "9"))),
    )
    .unwrap();

    // The owner's relationship slot was mutated and saved through the
    // primary repository
    match scenario
        .dispatcher
        .dispatch(EngineRequest::FindOne {
            resource_type: ResourceType::new("tasks"),
            id: ResourceId::new("1"),
        })
        .unwrap()
    {
        EngineResponse::One(Some(task)) => {
            assert_eq!(task.to_one("project"), Some(&reference("projects", "9")));
        }
        other => panic!("expected the task, got {:?}", other),
    }

    match read_relationship(&scenario, "tasks", "1", "project") {
        EngineResponse::One(Some(target)) => assert_eq!(target.id, ResourceId::new("9")),
        other => panic!("expected the set target, got {:?}", other),
    }

    patch_relationship(&scenario, "tasks", "1", "project", RelationshipPatch::ToOne(None))
        .unwrap();
    assert_eq!(
        read_relationship(&scenario, "tasks", "1", "project"),
        EngineResponse::One(None)
    );
}

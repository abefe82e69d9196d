mod common;

use std::sync::Arc;

use common::{
    patch_relationship, projects_information, reference, resource, scenario, users_information,
    FailingAddRepository, Scenario,
};
use relata_core::errors::{ErrorKind, RelataError};
use relata_core_types::{ResourceId, ResourceType};
use relata_engine::{EngineRequest, RelationshipPatch};
use relata_memory::InMemoryResourceRepository;

/// users(1), projects(5, 6, 7) and a relationship repository whose add
/// primitive refuses project 7
fn failing_scenario() -> (Scenario, Arc<FailingAddRepository>) {
    let relationship = Arc::new(FailingAddRepository::to_many(
        "users",
        "assignedProjects",
        "projects",
        "7",
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

#[test]
fn test_failed_addition_surfaces_partial_replace_with_detail() {
    let (scenario, relationship) = failing_scenario();
    let owner = ResourceId::new("1");

    // Existing relations that the replace will remove
    patch_relationship(
        &scenario,
        "users",
        "1",
        "assignedProjects",
        RelationshipPatch::ToMany(vec![reference("projects", "5")]),
    )
    .unwrap();

    // 6 adds fine, 7 is poisoned; 5 was already removed
    let result = patch_relationship(
        &scenario,
        "users",
        "1",
        "assignedProjects",
        RelationshipPatch::ToMany(vec![
            reference("projects", "6"),
            reference("projects", "7"),
            reference("projects", "5"),
        ]),
    );

    match result {
        Err(RelataError::PartialReplace {
            resource_type,
            id,
            field_name,
            removed,
            added,
            failed,
            source,
        }) => {
            assert_eq!(resource_type, ResourceType::new("users"));
            assert_eq!(id, owner);
            assert_eq!(field_name, "assignedProjects");
            assert_eq!(removed, vec![ResourceId::new("5")]);
            assert_eq!(added, vec![ResourceId::new("6")]);
            assert_eq!(failed, ResourceId::new("7"));
            assert!(matches!(*source, RelataError::Repository { .. }));
        }
        other => panic!("expected PartialReplace, got {:?}", other),
    }

    // No rollback: the set is left partially mutated, old relation gone,
    // successfully added relation present, nothing after the failure applied
    assert_eq!(relationship.relation_ids(&owner), vec![ResourceId::new("6")]);
}

#[test]
fn test_partial_replace_kind_and_status() {
    let (scenario, _relationship) = failing_scenario();

    let err = patch_relationship(
        &scenario,
        "users",
        "1",
        "assignedProjects",
        RelationshipPatch::ToMany(vec![reference("projects", "7")]),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PartialMutation);
    assert_eq!(err.http_status(), 500);
    assert_eq!(err.code(), "ERR_PARTIAL_MUTATION");
}

#[test]
fn test_partial_replace_translates_to_error_document() {
    let (scenario, _relationship) = failing_scenario();

    let outcome = scenario
        .dispatcher
        .dispatch_to_document(EngineRequest::PatchRelationship {
            owner_type: ResourceType::new("users"),
            owner_id: ResourceId::new("1"),
            field_name: "assignedProjects".to_string(),
            patch: RelationshipPatch::ToMany(vec![reference("projects", "7")]),
        });

    let document = outcome.unwrap_err();
    assert_eq!(document.status, 500);
    assert_eq!(document.code, "ERR_PARTIAL_MUTATION");
    // Enough detail for the caller to reconcile manually
    let detail = document.detail.unwrap();
    assert!(detail.contains("assignedProjects"));
    assert!(detail.contains("7"));
}

#[test]
fn test_successful_replace_after_failure_recovers_state() {
    let (scenario, relationship) = failing_scenario();
    let owner = ResourceId::new("1");

    let _ = patch_relationship(
        &scenario,
        "users",
        "1",
        "assignedProjects",
        RelationshipPatch::ToMany(vec![reference("projects", "6"), reference("projects", "7")]),
    );

    // The caller reconciles by replaying a clean list; the engine itself
    // never retried
    patch_relationship(
        &scenario,
        "users",
        "1",
        "assignedProjects",
        RelationshipPatch::ToMany(vec![reference("projects", "5"), reference("projects", "6")]),
    )
    .unwrap();
    assert_eq!(
        relationship.relation_ids(&owner),
        vec![ResourceId::new("5"), ResourceId::new("6")]
    );
}

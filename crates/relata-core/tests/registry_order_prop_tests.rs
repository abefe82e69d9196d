mod common;

use std::sync::Arc;

use common::{module, projects_information, SetupModule, TestRelationshipRepository, TestResourceRepository};
use proptest::prelude::*;
use relata_core::errors::RelataError;
use relata_core::model::{Cardinality, RelationshipInformation, ResourceInformation};
use relata_core::registry::RelationshipBinding;
use relata_core::{CoreModule, ModuleRegistry};
use relata_core_types::ResourceType;

fn resource_module_with_direct_declaration() -> SetupModule {
    module("resource", |context| {
        let information = ResourceInformation::new("tasks", "tasks-repository").with_relationship(
            RelationshipInformation::to_one("project", "tasks", "projects").directly_resolvable(),
        );
        context.add_resource_repository(Arc::new(TestResourceRepository::new(information)));
    })
}

fn relationship_module() -> SetupModule {
    module("relationship", |context| {
        context.add_relationship_repository(Arc::new(TestRelationshipRepository::new(
            "tasks",
            "project",
            "projects",
            Cardinality::One,
        )));
    })
}

fn projects_module() -> SetupModule {
    module("projects", |context| {
        context.add_resource_repository(Arc::new(TestResourceRepository::new(
            projects_information(),
        )));
    })
}

proptest! {
    /// The directly-resolvable declaration beats a separately registered
    /// relationship repository for every module registration order
    #[test]
    fn test_direct_declaration_wins_for_any_order(order in Just(vec![0usize, 1, 2]).prop_shuffle()) {
        let mut modules = ModuleRegistry::new();
        modules.add_module(&CoreModule).unwrap();
        for index in order {
            let setup = match index {
                0 => resource_module_with_direct_declaration(),
                1 => relationship_module(),
                _ => projects_module(),
            };
            modules.add_module(&setup).unwrap();
        }

        let registry = modules.init().unwrap();
        let entry = registry.get_entry(&ResourceType::new("tasks")).unwrap();
        let relationship = entry.relationship_entry("project").unwrap();
        prop_assert!(matches!(relationship.binding(), RelationshipBinding::Direct));
    }

    /// Two resource repositories for one type always fail, whatever the order
    #[test]
    fn test_duplicate_resource_repository_fails_for_any_order(order in Just(vec![0usize, 1, 2]).prop_shuffle()) {
        let mut modules = ModuleRegistry::new();
        modules.add_module(&CoreModule).unwrap();
        for index in order {
            let setup = match index {
                0 => module("dup-a", |context| {
                    context.add_resource_repository(Arc::new(TestResourceRepository::new(
                        ResourceInformation::new("tasks", "tasks-repository-a"),
                    )));
                }),
                1 => module("dup-b", |context| {
                    context.add_resource_repository(Arc::new(TestResourceRepository::new(
                        ResourceInformation::new("tasks", "tasks-repository-b"),
                    )));
                }),
                _ => projects_module(),
            };
            modules.add_module(&setup).unwrap();
        }

        prop_assert!(
            matches!(
                modules.init(),
                Err(RelataError::DuplicateResourceRepository { .. })
            ),
            "expected DuplicateResourceRepository error"
        );
    }
}

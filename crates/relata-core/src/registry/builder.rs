//! Freeze-time registry aggregation
//!
//! Runs exactly once, from `ModuleRegistry::init`. Classifies every raw
//! repository through the combined repository-information builder, groups
//! the results by pertaining resource type, binds primaries and
//! relationship entries, decorates every repository through the chain, and
//! produces the frozen tables. Any error here is fatal to startup: no
//! partial registry is ever published.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use relata_core_types::ResourceType;
use tracing::debug;

use crate::decorate::{DecoratorChain, RepositoryDecoratorFactory};
use crate::errors::{RelataError, Result};
use crate::model::{RelationshipInformation, ResourceInformation};
use crate::module::builders::{
    CombinedRepositoryInformationBuilder, CombinedResourceInformationBuilder,
    RepositoryInformation, ResourceLookup,
};
use crate::module::ContributedRepository;
use crate::paging::PagingSpec;
use crate::registry::{RegistryEntry, RegistryHandle, RegistryTables, RelationshipEntry};
use crate::repository::{
    RelationshipRepository, RelationshipRepositoryAdapter, RepositoryFilter, RepositoryInstance,
    ResourceRepository, ResourceRepositoryAdapter,
};

pub(crate) struct RegistryBuildInput<'a> {
    pub repositories: Vec<ContributedRepository>,
    pub resource_information_builder: CombinedResourceInformationBuilder,
    pub repository_information_builder: CombinedRepositoryInformationBuilder,
    pub resource_lookups: &'a [Arc<dyn ResourceLookup>],
    pub decorator_factories: &'a [Arc<dyn RepositoryDecoratorFactory>],
    pub filters: Arc<[Arc<dyn RepositoryFilter>]>,
}

/// Classified contributions pertaining to one resource type
#[derive(Default)]
struct Group {
    resource: Option<(String, ResourceInformation, Arc<dyn ResourceRepository>)>,
    relationships: Vec<(String, RelationshipInformation, Arc<dyn RelationshipRepository>)>,
}

pub(crate) fn build(
    input: RegistryBuildInput<'_>,
    handle: &RegistryHandle,
) -> Result<RegistryTables> {
    let mut order: Vec<ResourceType> = Vec::new();
    let mut groups: HashMap<ResourceType, Group> = HashMap::new();

    // ===== 1. Classify and group =====
    for contributed in input.repositories {
        let information = input
            .repository_information_builder
            .build(&contributed.instance, &contributed.module)?;
        match information {
            RepositoryInformation::Resource(resource_information) => {
                let repository = match &contributed.instance {
                    RepositoryInstance::Resource(repository) => repository.clone(),
                    RepositoryInstance::Relationship(_) => {
                        return Err(RelataError::UnsupportedRepository {
                            module: contributed.module,
                        });
                    }
                };
                let resource_type = resource_information.resource_type.clone();
                let group = group_for(&mut groups, &mut order, &resource_type);
                if let Some((first_module, _, _)) = &group.resource {
                    return Err(RelataError::DuplicateResourceRepository {
                        resource_type,
                        first_module: first_module.clone(),
                        second_module: contributed.module,
                    });
                }
                group.resource = Some((contributed.module, resource_information, repository));
            }
            RepositoryInformation::Relationship(relationship_information) => {
                let repository = match &contributed.instance {
                    RepositoryInstance::Relationship(repository) => repository.clone(),
                    RepositoryInstance::Resource(_) => {
                        return Err(RelataError::UnsupportedRepository {
                            module: contributed.module,
                        });
                    }
                };
                let source_type = relationship_information.source_type.clone();
                let group = group_for(&mut groups, &mut order, &source_type);
                if let Some((first_module, _, _)) = group
                    .relationships
                    .iter()
                    .find(|(_, existing, _)| existing.field_name == relationship_information.field_name)
                {
                    return Err(RelataError::DuplicateRelationshipRepository {
                        resource_type: source_type,
                        field_name: relationship_information.field_name,
                        first_module: first_module.clone(),
                        second_module: contributed.module,
                    });
                }
                group
                    .relationships
                    .push((contributed.module, relationship_information, repository));
            }
        }
    }

    // Resource lookups join the grouping without repositories
    for lookup in input.resource_lookups {
        for resource_type in lookup.resource_types() {
            group_for(&mut groups, &mut order, &resource_type);
        }
    }

    // ===== 2. Build one entry per resource type =====
    let chain = DecoratorChain::new(input.decorator_factories);
    let mut tables = RegistryTables::new();

    for resource_type in &order {
        let group = groups.remove(resource_type).unwrap_or_default();

        let (information, primary_raw) = match group.resource {
            Some((_, information, repository)) => (information, Some(repository)),
            // Relationship-only resource: synthesize an information-only entry
            None => (
                input.resource_information_builder.build(resource_type)?,
                None,
            ),
        };
        information.validate()?;

        let relationships = bind_relationships(
            &information,
            group.relationships,
            &chain,
            handle,
            &input.filters,
        );

        let primary = primary_raw.map(|raw| {
            let decorated = chain.decorate_resource(raw, handle);
            ResourceRepositoryAdapter::new(decorated, input.filters.clone())
        });

        debug!(
            resource_type = %information.resource_type,
            has_primary = primary.is_some(),
            relationship_count = relationships.len(),
            "registering entry"
        );
        tables.insert(Arc::new(RegistryEntry::new(
            information,
            primary,
            relationships,
            PagingSpec::default(),
        )));
    }

    validate_parent_links(&tables, &order)?;
    Ok(tables)
}

/// Derive the relationship entry list of one resource type
///
/// Declared fields come first, in declaration order. A separately
/// contributed relationship repository binds the matching field unless the
/// declaration is directly resolvable, in which case the direct form wins
/// deterministically regardless of registration order. Repository
/// contributions for undeclared fields are appended in contribution order.
fn bind_relationships(
    information: &ResourceInformation,
    contributed: Vec<(String, RelationshipInformation, Arc<dyn RelationshipRepository>)>,
    chain: &DecoratorChain<'_>,
    handle: &RegistryHandle,
    filters: &Arc<[Arc<dyn RepositoryFilter>]>,
) -> Vec<RelationshipEntry> {
    let mut bound_fields: HashSet<String> = HashSet::new();
    let mut entries = Vec::new();

    for declared in &information.relationships {
        let matching = contributed
            .iter()
            .find(|(_, advertised, _)| advertised.field_name == declared.field_name);
        match matching {
            Some((_, _, repository)) if !declared.directly_resolvable => {
                bound_fields.insert(declared.field_name.clone());
                let decorated = chain.decorate_relationship(repository.clone(), handle);
                entries.push(RelationshipEntry::with_repository(
                    declared.clone(),
                    RelationshipRepositoryAdapter::new(decorated, filters.clone()),
                ));
            }
            Some(_) => {
                // Directly resolvable declaration shadows the repository
                bound_fields.insert(declared.field_name.clone());
                entries.push(RelationshipEntry::direct(declared.clone()));
            }
            None => entries.push(RelationshipEntry::direct(declared.clone())),
        }
    }

    for (_, advertised, repository) in contributed {
        if bound_fields.contains(&advertised.field_name) {
            continue;
        }
        let decorated = chain.decorate_relationship(repository, handle);
        entries.push(RelationshipEntry::with_repository(
            advertised,
            RelationshipRepositoryAdapter::new(decorated, filters.clone()),
        ));
    }

    entries
}

/// Parent types must be registered and chains must be acyclic
fn validate_parent_links(tables: &RegistryTables, order: &[ResourceType]) -> Result<()> {
    for resource_type in order {
        let Some(entry) = tables.get(resource_type) else {
            continue;
        };
        if let Some(parent) = entry.parent_type() {
            if !tables.contains(&parent) {
                return Err(RelataError::UnknownParentType {
                    resource_type: resource_type.clone(),
                    parent_type: parent,
                });
            }
        }

        let mut visited: HashSet<ResourceType> = HashSet::new();
        let mut current = resource_type.clone();
        while let Some(parent) = tables.get(&current).and_then(|entry| entry.parent_type()) {
            if !visited.insert(current.clone()) {
                return Err(RelataError::ParentCycle {
                    resource_type: resource_type.clone(),
                });
            }
            current = parent;
        }
    }
    Ok(())
}

fn group_for<'g>(
    groups: &'g mut HashMap<ResourceType, Group>,
    order: &mut Vec<ResourceType>,
    resource_type: &ResourceType,
) -> &'g mut Group {
    groups.entry(resource_type.clone()).or_insert_with(|| {
        order.push(resource_type.clone());
        Group::default()
    })
}

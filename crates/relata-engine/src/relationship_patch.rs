//! Relationship PATCH semantics
//!
//! State machine per request: RESOLVE_OWNER → RESOLVE_TARGETS → APPLY →
//! PERSIST. To-one patches set or clear the single target; to-many patches
//! replace the full relation set with the supplied ordered list. All target
//! references are validated and resolved before anything is mutated, so
//! validation failures leave the owner untouched.
//!
//! A to-many replace against a relationship repository runs as discrete
//! primitives: remove all current relations, then one add call per supplied
//! target in list order. A failure after partial removal/addition surfaces
//! as `PartialReplace` with the removed ids, the ids added so far and the
//! failing target; there is no rollback and no retry.

use relata_core::errors::{RelataError, Result};
use relata_core::model::{Cardinality, RelationshipInformation, Resource};
use relata_core::registry::{RelationshipBinding, ResourceRegistry};
use relata_core::repository::RelationshipRepositoryAdapter;
use relata_core_types::{ResourceId, ResourceRef, ResourceType};

use crate::requests::RelationshipPatch;

/// Targets after validation and resolution, ready to apply
enum ResolvedTargets {
    /// To-one clear
    Clear,
    /// To-one set
    SetOne(Resource),
    /// To-many full replacement, in submitted order
    ReplaceMany(Vec<Resource>),
}

/// Apply a relationship PATCH against the owner's resolved binding
pub fn patch_relationship(
    registry: &ResourceRegistry,
    owner_type: &ResourceType,
    owner_id: &ResourceId,
    field_name: &str,
    patch: RelationshipPatch,
) -> Result<()> {
    // ===== RESOLVE_OWNER =====
    let entry = registry.get_entry(owner_type)?;
    let relationship = entry.relationship_entry(field_name)?.clone();
    let primary = entry.resource_repository()?;
    let owner = primary.find_one(owner_id)?;

    // ===== RESOLVE_TARGETS =====
    let information = relationship.information();
    let resolved = resolve_targets(registry, information, patch)?;

    // ===== APPLY + PERSIST =====
    match relationship.binding() {
        RelationshipBinding::Direct => {
            let mut owner = owner;
            match resolved {
                ResolvedTargets::Clear => owner.set_to_one(field_name, None),
                ResolvedTargets::SetOne(target) => {
                    owner.set_to_one(field_name, Some(target.reference()));
                }
                ResolvedTargets::ReplaceMany(targets) => {
                    let references = targets.iter().map(Resource::reference).collect();
                    owner.set_to_many(field_name, references);
                }
            }
            primary.save(owner)?;
        }
        RelationshipBinding::Repository(adapter) => match resolved {
            ResolvedTargets::Clear => adapter.set_relation(owner_id, field_name, None)?,
            ResolvedTargets::SetOne(target) => {
                adapter.set_relation(owner_id, field_name, Some(target.id))?;
            }
            ResolvedTargets::ReplaceMany(targets) => {
                replace_many(adapter, owner_type, owner_id, field_name, targets)?;
            }
        },
    }
    Ok(())
}

/// Validate every reference against the declared target affiliation, then
/// resolve each to a concrete entity
///
/// Validation of all references happens before any resolution; resolution
/// happens before any mutation.
fn resolve_targets(
    registry: &ResourceRegistry,
    information: &RelationshipInformation,
    patch: RelationshipPatch,
) -> Result<ResolvedTargets> {
    match (information.cardinality, patch) {
        (Cardinality::One, RelationshipPatch::ToOne(None)) => Ok(ResolvedTargets::Clear),
        (Cardinality::One, RelationshipPatch::ToOne(Some(reference))) => {
            validate_affiliation(registry, information, &reference)?;
            resolve_target(registry, &reference).map(ResolvedTargets::SetOne)
        }
        (Cardinality::Many, RelationshipPatch::ToMany(references)) => {
            for reference in &references {
                validate_affiliation(registry, information, reference)?;
            }
            references
                .iter()
                .map(|reference| resolve_target(registry, reference))
                .collect::<Result<Vec<_>>>()
                .map(ResolvedTargets::ReplaceMany)
        }
        (expected, _) => Err(RelataError::CardinalityMismatch {
            field_name: information.field_name.clone(),
            expected,
        }),
    }
}

/// The reference type must be a declared target or a strict descendant of
/// one, enabling heterogeneous collections behind a polymorphic declaration
fn validate_affiliation(
    registry: &ResourceRegistry,
    information: &RelationshipInformation,
    reference: &ResourceRef,
) -> Result<()> {
    for declared in &information.target_types {
        if registry.is_affiliated(&reference.resource_type, declared)? {
            return Ok(());
        }
    }
    Err(RelataError::TargetTypeMismatch {
        field_name: information.field_name.clone(),
        reference: reference.clone(),
        declared: information.target_types.clone(),
    })
}

/// Resolve a reference through its own type's registry entry
fn resolve_target(registry: &ResourceRegistry, reference: &ResourceRef) -> Result<Resource> {
    let entry = registry.get_entry(&reference.resource_type)?;
    entry.resource_repository()?.find_one(&reference.id)
}

/// Full replace as discrete repository primitives
///
/// A remove-phase failure leaves the relation set untouched and propagates
/// as-is. An add-phase failure leaves the set partially mutated and is
/// surfaced as `PartialReplace`; the caller reconciles manually.
fn replace_many(
    adapter: &RelationshipRepositoryAdapter,
    owner_type: &ResourceType,
    owner_id: &ResourceId,
    field_name: &str,
    targets: Vec<Resource>,
) -> Result<()> {
    let current: Vec<ResourceId> = adapter
        .find_many_targets(owner_id, field_name)?
        .into_iter()
        .map(|target| target.id)
        .collect();
    if !current.is_empty() {
        adapter.remove_relations(owner_id, field_name, current.clone())?;
    }

    let mut added: Vec<ResourceId> = Vec::new();
    for target in targets {
        let target_id = target.id;
        match adapter.add_relations(owner_id, field_name, vec![target_id.clone()]) {
            Ok(()) => added.push(target_id),
            Err(source) => {
                return Err(RelataError::PartialReplace {
                    resource_type: owner_type.clone(),
                    id: owner_id.clone(),
                    field_name: field_name.to_string(),
                    removed: current,
                    added,
                    failed: target_id,
                    source: Box::new(source),
                });
            }
        }
    }
    Ok(())
}

//! The frozen resource registry
//!
//! The registry is the lookup table consulted on every request: resource
//! type → [`RegistryEntry`]. It goes through a one-way COLLECTING → FROZEN
//! lifecycle: the inner tables are published exactly once at initialization
//! and are immutable afterwards, so arbitrarily many request-handling
//! threads can read without synchronization.

mod entry;

pub(crate) mod builder;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, Weak};

use relata_core_types::{ImplementationId, ResourceType};

pub use entry::{RegistryEntry, RelationshipBinding, RelationshipEntry};

use crate::errors::{RelataError, Result};

pub(crate) struct RegistryTables {
    by_type: HashMap<ResourceType, Arc<RegistryEntry>>,
    by_implementation: HashMap<ImplementationId, ResourceType>,
    /// Registration order, for deterministic `entries()` output
    order: Vec<ResourceType>,
}

impl RegistryTables {
    pub(crate) fn new() -> Self {
        Self {
            by_type: HashMap::new(),
            by_implementation: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, entry: Arc<RegistryEntry>) {
        let resource_type = entry.resource_type().clone();
        self.by_implementation
            .insert(entry.implementation_id().clone(), resource_type.clone());
        self.by_type.insert(resource_type.clone(), entry);
        self.order.push(resource_type);
    }

    pub(crate) fn contains(&self, resource_type: &ResourceType) -> bool {
        self.by_type.contains_key(resource_type)
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.by_type.len()
    }

    pub(crate) fn get(&self, resource_type: &ResourceType) -> Option<&Arc<RegistryEntry>> {
        self.by_type.get(resource_type)
    }
}

struct RegistryInner {
    tables: OnceLock<RegistryTables>,
}

/// The frozen, thread-safe resource type lookup table
///
/// Cheap to clone; all clones share the same frozen state.
#[derive(Clone)]
pub struct ResourceRegistry {
    inner: Arc<RegistryInner>,
}

impl ResourceRegistry {
    /// Create a registry in the COLLECTING state, before its tables exist
    pub(crate) fn collecting() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                tables: OnceLock::new(),
            }),
        }
    }

    /// Publish the frozen tables; the one-way COLLECTING → FROZEN transition
    pub(crate) fn publish(&self, tables: RegistryTables) -> Result<()> {
        self.inner
            .tables
            .set(tables)
            .map_err(|_| RelataError::AlreadyInitialized)
    }

    /// A non-owning handle suitable for injection into repositories
    pub fn handle(&self) -> RegistryHandle {
        RegistryHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn tables(&self) -> Result<&RegistryTables> {
        self.inner
            .tables
            .get()
            .ok_or_else(|| RelataError::NotInitialized {
                what: "resource registry".to_string(),
            })
    }

    /// Look up the entry of a resource type
    ///
    /// # Errors
    /// Returns `NotRegistered` for unknown types; an unresolvable resource
    /// type is a hard routing failure, never an absent value.
    pub fn get_entry(&self, resource_type: &ResourceType) -> Result<Arc<RegistryEntry>> {
        self.tables()?
            .by_type
            .get(resource_type)
            .cloned()
            .ok_or_else(|| RelataError::NotRegistered {
                resource_type: resource_type.clone(),
            })
    }

    /// Look up the entry owned by a backing implementation
    ///
    /// # Errors
    /// Returns `ImplementationNotRegistered` for unknown implementations.
    pub fn get_entry_by_implementation(
        &self,
        implementation_id: &ImplementationId,
    ) -> Result<Arc<RegistryEntry>> {
        let tables = self.tables()?;
        let resource_type = tables.by_implementation.get(implementation_id).ok_or_else(|| {
            RelataError::ImplementationNotRegistered {
                implementation_id: implementation_id.clone(),
            }
        })?;
        self.get_entry(resource_type)
    }

    /// True when the type has an entry (and the registry is frozen)
    pub fn has_entry(&self, resource_type: &ResourceType) -> bool {
        self.tables()
            .map(|tables| tables.contains(resource_type))
            .unwrap_or(false)
    }

    /// All entries, in registration order
    pub fn entries(&self) -> Result<Vec<Arc<RegistryEntry>>> {
        let tables = self.tables()?;
        Ok(tables
            .order
            .iter()
            .filter_map(|resource_type| tables.by_type.get(resource_type).cloned())
            .collect())
    }

    /// Check whether `candidate` is `declared` or a strict descendant of it
    /// via parent links
    ///
    /// Unknown candidate types are simply not affiliated. The walk is
    /// cycle-guarded: a revisited type terminates the walk unaffiliated
    /// (cycles can only appear through the deprecated parent reassignment).
    pub fn is_affiliated(
        &self,
        candidate: &ResourceType,
        declared: &ResourceType,
    ) -> Result<bool> {
        if candidate == declared {
            return Ok(true);
        }
        let mut visited: HashSet<ResourceType> = HashSet::new();
        let mut current = candidate.clone();
        loop {
            if !visited.insert(current.clone()) {
                return Ok(false);
            }
            let entry = match self.get_entry(&current) {
                Ok(entry) => entry,
                Err(RelataError::NotRegistered { .. }) => return Ok(false),
                Err(other) => return Err(other),
            };
            match entry.parent_type() {
                Some(parent) => {
                    if &parent == declared {
                        return Ok(true);
                    }
                    current = parent;
                }
                None => return Ok(false),
            }
        }
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.inner.tables.get().is_some() {
            "frozen"
        } else {
            "collecting"
        };
        f.debug_struct("ResourceRegistry").field("state", &state).finish()
    }
}

/// Non-owning registry reference injected into registry-aware repositories
///
/// The handle does not keep the registry alive; repositories look entries
/// up through it but do not own it.
#[derive(Clone)]
pub struct RegistryHandle {
    inner: Weak<RegistryInner>,
}

impl RegistryHandle {
    /// Upgrade to the registry
    ///
    /// # Errors
    /// Returns `RegistryGone` when the registry has been dropped.
    pub fn get(&self) -> Result<ResourceRegistry> {
        self.inner
            .upgrade()
            .map(|inner| ResourceRegistry { inner })
            .ok_or(RelataError::RegistryGone)
    }
}

impl std::fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryHandle").finish()
    }
}

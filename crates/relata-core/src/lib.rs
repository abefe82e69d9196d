//! Relata Core - Resource registry kernel
//!
//! This crate provides the registry and contribution machinery for routing
//! typed resource requests against independently registered backing
//! repositories:
//! - Resource and relationship descriptors with the dynamic resource record
//! - Module contribution aggregation with a one-way COLLECTING → FROZEN lifecycle
//! - Information builders behind an accept/build, first-accept-wins protocol
//! - An ordered, capability-typed repository decorator chain
//! - The frozen, thread-shareable resource registry and its entries
//! - Repository filters, error facility, error-mapper registry and the
//!   security-provider contract

pub mod decorate;
pub mod errors;
pub mod logging_facility;
pub mod mappers;
pub mod model;
pub mod module;
pub mod paging;
pub mod registry;
pub mod repository;
pub mod security;

// Re-export commonly used types
pub use errors::{ErrorKind, RelataError, Result};
pub use model::{Cardinality, RelationshipInformation, Resource, ResourceInformation};
pub use module::{CoreModule, LifecycleState, Module, ModuleContext, ModuleRegistry};
pub use registry::{
    RegistryEntry, RegistryHandle, RelationshipBinding, RelationshipEntry, ResourceRegistry,
};
pub use repository::{
    RelationshipRepository, RelationshipRepositoryAdapter, RepositoryFilter, RepositoryInstance,
    ResourceRepository, ResourceRepositoryAdapter,
};

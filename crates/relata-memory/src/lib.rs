//! In-memory repository implementations
//!
//! These repositories back tests and demos. They are collaborators of the
//! registry kernel, not part of it: the kernel only sees them through the
//! repository contracts.

mod relationship;
mod resource;

pub use relationship::InMemoryRelationshipRepository;
pub use resource::InMemoryResourceRepository;

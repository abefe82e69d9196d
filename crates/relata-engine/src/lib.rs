//! Relata Engine - Request orchestration layer
//!
//! Routes typed resource requests against the frozen resource registry and
//! applies relationship PATCH semantics (to-one set/clear, to-many full
//! replacement) against the resolved repository bindings.

pub mod dispatch;
pub mod relationship_patch;
pub mod requests;

pub use dispatch::RequestDispatcher;
pub use requests::{EngineRequest, EngineResponse, RelationshipPatch};

//! Core types shared across Relata facilities
//!
//! This crate provides foundational types used by the registry, the engine
//! and the logging/error facilities:
//!
//! - **Identity types**: ResourceType, ResourceId, ResourceRef, ImplementationId
//! - **Correlation types**: RequestId, TraceId, RequestContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod identity;
pub mod schema;

pub use correlation::{RequestContext, RequestId, TraceId};
pub use identity::{ImplementationId, ResourceId, ResourceRef, ResourceType};

//! Domain model: resource descriptors and the dynamic resource record

mod information;
mod resource;

pub use information::{Cardinality, RelationshipInformation, ResourceInformation};
pub use resource::Resource;

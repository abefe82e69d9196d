//! Decorator chain applied to raw repositories at freeze time
//!
//! Factories are consulted in module registration order. Each factory
//! targets one repository shape through its capability-typed method; a
//! factory that returns `None` declines and the working object is left
//! untouched. A factory that applies builds its wrapper around the current
//! object, so the wrapper→wrapped link is established by construction.
//!
//! After the chain completes, a final object exposing the registry-aware
//! capability receives a non-owning handle to the resource registry.

use std::sync::Arc;

use crate::registry::RegistryHandle;
use crate::repository::{RelationshipRepository, ResourceRepository};

/// Capability-typed factory for repository decorators
///
/// Implement the method matching the shape the factory targets; the default
/// implementations decline.
pub trait RepositoryDecoratorFactory: Send + Sync {
    /// Wrap a resource repository, or decline with `None`
    fn decorate_resource_repository(
        &self,
        _inner: &Arc<dyn ResourceRepository>,
    ) -> Option<Arc<dyn ResourceRepository>> {
        None
    }

    /// Wrap a relationship repository, or decline with `None`
    fn decorate_relationship_repository(
        &self,
        _inner: &Arc<dyn RelationshipRepository>,
    ) -> Option<Arc<dyn RelationshipRepository>> {
        None
    }
}

/// Ordered decorator chain over the contributed factories
pub struct DecoratorChain<'a> {
    factories: &'a [Arc<dyn RepositoryDecoratorFactory>],
}

impl<'a> DecoratorChain<'a> {
    pub fn new(factories: &'a [Arc<dyn RepositoryDecoratorFactory>]) -> Self {
        Self { factories }
    }

    /// Run a resource repository through the chain and inject the registry
    /// handle into the final object when it asks for one
    pub fn decorate_resource(
        &self,
        raw: Arc<dyn ResourceRepository>,
        registry: &RegistryHandle,
    ) -> Arc<dyn ResourceRepository> {
        let mut current = raw;
        for factory in self.factories {
            if let Some(wrapped) = factory.decorate_resource_repository(&current) {
                current = wrapped;
            }
        }
        if let Some(aware) = current.as_registry_aware() {
            aware.set_resource_registry(registry.clone());
        }
        current
    }

    /// Run a relationship repository through the chain and inject the
    /// registry handle into the final object when it asks for one
    pub fn decorate_relationship(
        &self,
        raw: Arc<dyn RelationshipRepository>,
        registry: &RegistryHandle,
    ) -> Arc<dyn RelationshipRepository> {
        let mut current = raw;
        for factory in self.factories {
            if let Some(wrapped) = factory.decorate_relationship_repository(&current) {
                current = wrapped;
            }
        }
        if let Some(aware) = current.as_registry_aware() {
            aware.set_resource_registry(registry.clone());
        }
        current
    }
}

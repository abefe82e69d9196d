//! Module contribution aggregation and the registry lifecycle
//!
//! Extension modules contribute builders, repositories, decorators, filters,
//! error mappers and security providers during a single-threaded setup
//! phase. `ModuleRegistry::init` freezes the collected contributions into
//! the immutable resource registry and the error-mapper registry; the
//! COLLECTING → FROZEN transition is one-way and happens exactly once.

pub mod builders;

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::decorate::RepositoryDecoratorFactory;
use crate::errors::{RelataError, Result};
use crate::mappers::{ErrorMapper, ErrorMapperLookup, ErrorMapperRegistry, SingleErrorMapperLookup};
use crate::model::ResourceInformation;
use crate::registry::{builder as registry_builder, ResourceRegistry};
use crate::repository::{
    RelationshipRepository, RepositoryFilter, RepositoryInstance, ResourceRepository,
    ServiceDiscovery,
};
use crate::security::SecurityProvider;

use builders::{
    CombinedRepositoryInformationBuilder, CombinedResourceInformationBuilder,
    DeclaredResourceInformation, DefaultRepositoryInformationBuilder, RepositoryInformationBuilder,
    ResourceInformationBuilder, ResourceLookup,
};

/// Registry lifecycle state; the transition is one-way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Contributions are accepted
    Collecting,
    /// Contributions are rejected; the registry is published
    Frozen,
}

/// An extension module contributing to the registry
///
/// `setup` runs immediately when the module is added and is the only point
/// at which a module can contribute.
pub trait Module {
    /// Stable module name, used in conflict diagnostics
    fn module_name(&self) -> &'static str;

    /// Contribute through the context
    fn setup(&self, context: &mut ModuleContext<'_>) -> Result<()>;
}

/// A repository instance together with the module that contributed it
#[derive(Clone)]
pub struct ContributedRepository {
    pub(crate) module: String,
    pub(crate) instance: RepositoryInstance,
}

/// Everything collected from modules during the COLLECTING phase
#[derive(Default)]
struct Contributions {
    resource_information_builders: Vec<Arc<dyn ResourceInformationBuilder>>,
    repository_information_builders: Vec<Arc<dyn RepositoryInformationBuilder>>,
    resource_lookups: Vec<Arc<dyn ResourceLookup>>,
    decorator_factories: Vec<Arc<dyn RepositoryDecoratorFactory>>,
    repository_filters: Vec<Arc<dyn RepositoryFilter>>,
    error_mapper_lookups: Vec<Arc<dyn ErrorMapperLookup>>,
    security_providers: Vec<Arc<dyn SecurityProvider>>,
    repositories: Vec<ContributedRepository>,
}

/// Contribution surface handed to a module during setup
///
/// The context borrows the collector, so it cannot outlive the setup call;
/// contributions after freeze are rejected at the `add_module` boundary.
pub struct ModuleContext<'a> {
    module_name: String,
    contributions: &'a mut Contributions,
}

impl ModuleContext<'_> {
    /// The name of the module being set up
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Contribute a resource information builder
    pub fn add_resource_information_builder(
        &mut self,
        builder: Arc<dyn ResourceInformationBuilder>,
    ) {
        self.contributions.resource_information_builders.push(builder);
    }

    /// Declare resource information directly (wrapped in a builder)
    pub fn add_resource_information(&mut self, information: ResourceInformation) {
        self.add_resource_information_builder(Arc::new(DeclaredResourceInformation::new(
            information,
        )));
    }

    /// Contribute a repository information builder
    pub fn add_repository_information_builder(
        &mut self,
        builder: Arc<dyn RepositoryInformationBuilder>,
    ) {
        self.contributions
            .repository_information_builders
            .push(builder);
    }

    /// Contribute a resource lookup
    pub fn add_resource_lookup(&mut self, lookup: Arc<dyn ResourceLookup>) {
        self.contributions.resource_lookups.push(lookup);
    }

    /// Contribute a raw repository instance
    pub fn add_repository(&mut self, instance: RepositoryInstance) {
        self.contributions.repositories.push(ContributedRepository {
            module: self.module_name.clone(),
            instance,
        });
    }

    /// Contribute a resource repository
    pub fn add_resource_repository(&mut self, repository: Arc<dyn ResourceRepository>) {
        self.add_repository(RepositoryInstance::Resource(repository));
    }

    /// Contribute a relationship repository
    pub fn add_relationship_repository(&mut self, repository: Arc<dyn RelationshipRepository>) {
        self.add_repository(RepositoryInstance::Relationship(repository));
    }

    /// Contribute a decorator factory
    pub fn add_repository_decorator_factory(
        &mut self,
        factory: Arc<dyn RepositoryDecoratorFactory>,
    ) {
        self.contributions.decorator_factories.push(factory);
    }

    /// Contribute a repository filter
    pub fn add_repository_filter(&mut self, filter: Arc<dyn RepositoryFilter>) {
        self.contributions.repository_filters.push(filter);
    }

    /// Contribute an error mapper lookup
    pub fn add_error_mapper_lookup(&mut self, lookup: Arc<dyn ErrorMapperLookup>) {
        self.contributions.error_mapper_lookups.push(lookup);
    }

    /// Contribute a single error mapper (wrapped in a lookup)
    pub fn add_error_mapper(&mut self, mapper: Arc<dyn ErrorMapper>) {
        self.add_error_mapper_lookup(Arc::new(SingleErrorMapperLookup::new(mapper)));
    }

    /// Contribute a security provider
    ///
    /// Exactly one provider must be present across all modules; violations
    /// surface when the provider is first queried, not here, because
    /// contributions may arrive in any order across modules.
    pub fn add_security_provider(&mut self, provider: Arc<dyn SecurityProvider>) {
        self.contributions.security_providers.push(provider);
    }
}

/// Default contributions every deployment needs
///
/// Registers the repository information builder for the two built-in
/// repository shapes. Add this module first unless a deployment replaces
/// the classification protocol wholesale.
pub struct CoreModule;

impl Module for CoreModule {
    fn module_name(&self) -> &'static str {
        "relata.core"
    }

    fn setup(&self, context: &mut ModuleContext<'_>) -> Result<()> {
        context.add_repository_information_builder(Arc::new(DefaultRepositoryInformationBuilder));
        Ok(())
    }
}

/// Collector for module contributions and owner of the registry lifecycle
///
/// Two-phase: while COLLECTING, `add_module` runs each module's setup
/// against the shared contribution set; `init` freezes everything, builds
/// the resource registry and the error-mapper registry, and flips the state
/// to FROZEN. All registration happens single-threaded during startup.
#[derive(Default)]
pub struct ModuleRegistry {
    state: Option<FrozenState>,
    contributions: Contributions,
    module_names: Vec<String>,
    service_discovery: Option<Arc<dyn ServiceDiscovery>>,
}

struct FrozenState {
    registry: ResourceRegistry,
    error_mappers: Arc<ErrorMapperRegistry>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        if self.state.is_some() {
            LifecycleState::Frozen
        } else {
            LifecycleState::Collecting
        }
    }

    /// Names of the modules added so far, in registration order
    pub fn module_names(&self) -> &[String] {
        &self.module_names
    }

    /// Add a module and run its setup immediately
    ///
    /// # Errors
    /// Returns `ContributionAfterFreeze` once the registry is frozen.
    pub fn add_module(&mut self, module: &dyn Module) -> Result<()> {
        if self.state.is_some() {
            return Err(RelataError::ContributionAfterFreeze {
                contribution: "module".to_string(),
                module: module.module_name().to_string(),
            });
        }
        let mut context = ModuleContext {
            module_name: module.module_name().to_string(),
            contributions: &mut self.contributions,
        };
        module.setup(&mut context)?;
        self.module_names.push(module.module_name().to_string());
        Ok(())
    }

    /// Install the service-discovery source queried at freeze time
    ///
    /// # Errors
    /// Returns `ContributionAfterFreeze` once the registry is frozen.
    pub fn set_service_discovery(&mut self, discovery: Arc<dyn ServiceDiscovery>) -> Result<()> {
        if self.state.is_some() {
            return Err(RelataError::ContributionAfterFreeze {
                contribution: "service discovery".to_string(),
                module: "host".to_string(),
            });
        }
        self.service_discovery = Some(discovery);
        Ok(())
    }

    /// Freeze the collected contributions and build the registry
    ///
    /// Invoked exactly once at initialization. All errors here are fatal to
    /// startup; no partial registry is published.
    ///
    /// # Errors
    /// Returns `AlreadyInitialized` on a second call, or any configuration
    /// error raised while building the registry.
    pub fn init(&mut self) -> Result<ResourceRegistry> {
        if self.state.is_some() {
            return Err(RelataError::AlreadyInitialized);
        }
        let started = Instant::now();

        let mut repositories = self.contributions.repositories.clone();
        if let Some(discovery) = &self.service_discovery {
            for instance in discovery.discover_repositories() {
                repositories.push(ContributedRepository {
                    module: "service-discovery".to_string(),
                    instance,
                });
            }
        }

        let registry = ResourceRegistry::collecting();
        let handle = registry.handle();
        let input = registry_builder::RegistryBuildInput {
            repositories,
            resource_information_builder: CombinedResourceInformationBuilder::new(
                self.contributions.resource_information_builders.clone(),
            ),
            repository_information_builder: CombinedRepositoryInformationBuilder::new(
                self.contributions.repository_information_builders.clone(),
            ),
            resource_lookups: &self.contributions.resource_lookups,
            decorator_factories: &self.contributions.decorator_factories,
            filters: self.contributions.repository_filters.clone().into(),
        };
        let tables = registry_builder::build(input, &handle)?;
        let entry_count = tables.entry_count();
        registry.publish(tables)?;

        let error_mappers =
            Arc::new(ErrorMapperRegistry::build(&self.contributions.error_mapper_lookups));

        self.state = Some(FrozenState {
            registry: registry.clone(),
            error_mappers,
        });
        info!(
            entry_count,
            module_count = self.module_names.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "registry frozen"
        );
        Ok(registry)
    }

    /// The frozen resource registry
    ///
    /// # Errors
    /// Returns `NotInitialized` before `init`.
    pub fn resource_registry(&self) -> Result<ResourceRegistry> {
        self.state
            .as_ref()
            .map(|state| state.registry.clone())
            .ok_or_else(|| RelataError::NotInitialized {
                what: "resource registry".to_string(),
            })
    }

    /// The frozen error-mapper registry
    ///
    /// # Errors
    /// Returns `NotInitialized` before `init`.
    pub fn error_mapper_registry(&self) -> Result<Arc<ErrorMapperRegistry>> {
        self.state
            .as_ref()
            .map(|state| state.error_mappers.clone())
            .ok_or_else(|| RelataError::NotInitialized {
                what: "error mapper registry".to_string(),
            })
    }

    /// The single contributed security provider
    ///
    /// The exactly-one rule is enforced here, at first use, because
    /// contributions may arrive in any order across modules.
    ///
    /// # Errors
    /// Returns `MissingSecurityProvider` or `MultipleSecurityProviders`.
    pub fn security_provider(&self) -> Result<Arc<dyn SecurityProvider>> {
        match self.contributions.security_providers.as_slice() {
            [] => Err(RelataError::MissingSecurityProvider),
            [provider] => Ok(provider.clone()),
            providers => Err(RelataError::MultipleSecurityProviders {
                count: providers.len(),
            }),
        }
    }
}

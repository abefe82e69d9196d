//! Request dispatcher
//!
//! Consults the frozen registry on every request and routes to the resolved
//! repository binding. Construction resolves the security provider, which
//! is where the exactly-one contribution rule surfaces. Per-request errors
//! are translated into caller-visible error documents through the frozen
//! error-mapper registry; they never crash the process.

use std::sync::Arc;
use std::time::Instant;

use relata_core::errors::Result;
use relata_core::mappers::{ErrorDocument, ErrorMapperRegistry};
use relata_core::{log_op_end, log_op_error, log_op_start};
use relata_core::model::{Cardinality, Resource};
use relata_core::module::ModuleRegistry;
use relata_core::registry::{RegistryEntry, RelationshipBinding, ResourceRegistry};
use relata_core::security::SecurityProvider;
use relata_core_types::{RequestContext, ResourceId, ResourceRef};

use crate::relationship_patch;
use crate::requests::{EngineRequest, EngineResponse};

/// Routes typed resource requests against the frozen registry
///
/// Holds no locks; each request runs on the calling thread and may block on
/// the underlying repository's I/O. The dispatcher imposes no ordering
/// between concurrent requests touching the same state.
pub struct RequestDispatcher {
    registry: ResourceRegistry,
    error_mappers: Arc<ErrorMapperRegistry>,
    security_provider: Arc<dyn SecurityProvider>,
}

impl RequestDispatcher {
    /// Build a dispatcher from an initialized module registry
    ///
    /// # Errors
    /// Returns `NotInitialized` before `init`, or the security-provider
    /// cardinality error on its first use.
    pub fn new(modules: &ModuleRegistry) -> Result<Self> {
        let registry = modules.resource_registry()?;
        let error_mappers = modules.error_mapper_registry()?;
        let security_provider = modules.security_provider()?;
        Ok(Self {
            registry,
            error_mappers,
            security_provider,
        })
    }

    /// The frozen registry this dispatcher routes against
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// The single contributed security provider
    pub fn security_provider(&self) -> &Arc<dyn SecurityProvider> {
        &self.security_provider
    }

    /// Route a request under a fresh correlation context
    pub fn dispatch(&self, request: EngineRequest) -> Result<EngineResponse> {
        self.dispatch_in_context(&RequestContext::new(), request)
    }

    /// Route a request, logging start/end/error with the operation name and
    /// the caller-supplied correlation context
    pub fn dispatch_in_context(
        &self,
        context: &RequestContext,
        request: EngineRequest,
    ) -> Result<EngineResponse> {
        let op = request.op_name();
        let started = Instant::now();
        log_op_start!(op, request_id = %context.request_id);
        let result = self.route(request);
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                log_op_end!(op, duration_ms = duration_ms, request_id = %context.request_id)
            }
            Err(err) => log_op_error!(op, err, duration_ms = duration_ms),
        }
        result
    }

    /// Route a request, translating any failure into an error document
    pub fn dispatch_to_document(
        &self,
        request: EngineRequest,
    ) -> std::result::Result<EngineResponse, ErrorDocument> {
        self.dispatch(request)
            .map_err(|err| self.error_mappers.to_document(&err))
    }

    fn route(&self, request: EngineRequest) -> Result<EngineResponse> {
        match request {
            EngineRequest::FindOne { resource_type, id } => {
                let entry = self.registry.get_entry(&resource_type)?;
                let resource = entry.resource_repository()?.find_one(&id)?;
                Ok(EngineResponse::One(Some(resource)))
            }
            EngineRequest::FindAll {
                resource_type,
                paging,
            } => {
                let entry = self.registry.get_entry(&resource_type)?;
                let paging = paging.unwrap_or_else(|| entry.paging().clone());
                let resources = entry.resource_repository()?.find_all(&paging)?;
                Ok(EngineResponse::Many(resources))
            }
            EngineRequest::Create { resource } | EngineRequest::Update { resource } => {
                let entry = self.registry.get_entry(&resource.resource_type)?;
                let saved = entry.resource_repository()?.save(resource)?;
                Ok(EngineResponse::One(Some(saved)))
            }
            EngineRequest::Delete { resource_type, id } => {
                let entry = self.registry.get_entry(&resource_type)?;
                entry.resource_repository()?.delete(&id)?;
                Ok(EngineResponse::NoContent)
            }
            EngineRequest::FindRelationship {
                owner_type,
                owner_id,
                field_name,
            } => {
                let entry = self.registry.get_entry(&owner_type)?;
                self.find_relationship(&entry, &owner_id, &field_name)
            }
            EngineRequest::PatchRelationship {
                owner_type,
                owner_id,
                field_name,
                patch,
            } => {
                relationship_patch::patch_relationship(
                    &self.registry,
                    &owner_type,
                    &owner_id,
                    &field_name,
                    patch,
                )?;
                Ok(EngineResponse::NoContent)
            }
        }
    }

    fn find_relationship(
        &self,
        entry: &RegistryEntry,
        owner_id: &ResourceId,
        field_name: &str,
    ) -> Result<EngineResponse> {
        let relationship = entry.relationship_entry(field_name)?;
        let cardinality = relationship.information().cardinality;
        match relationship.binding() {
            RelationshipBinding::Repository(adapter) => match cardinality {
                Cardinality::One => {
                    let target = adapter.find_one_target(owner_id, field_name)?;
                    Ok(EngineResponse::One(target))
                }
                Cardinality::Many => {
                    let targets = adapter.find_many_targets(owner_id, field_name)?;
                    Ok(EngineResponse::Many(targets))
                }
            },
            RelationshipBinding::Direct => {
                let owner = entry.resource_repository()?.find_one(owner_id)?;
                match cardinality {
                    Cardinality::One => match owner.to_one(field_name) {
                        Some(reference) => {
                            let target = self.resolve_reference(reference)?;
                            Ok(EngineResponse::One(Some(target)))
                        }
                        None => Ok(EngineResponse::One(None)),
                    },
                    Cardinality::Many => {
                        let targets = owner
                            .to_many(field_name)
                            .iter()
                            .map(|reference| self.resolve_reference(reference))
                            .collect::<Result<Vec<_>>>()?;
                        Ok(EngineResponse::Many(targets))
                    }
                }
            }
        }
    }

    fn resolve_reference(&self, reference: &ResourceRef) -> Result<Resource> {
        let entry = self.registry.get_entry(&reference.resource_type)?;
        entry.resource_repository()?.find_one(&reference.id)
    }
}

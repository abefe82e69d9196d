use relata_core_types::{ImplementationId, ResourceId, ResourceRef, ResourceType};
use thiserror::Error;

use crate::model::Cardinality;

/// Result type alias using RelataError
pub type Result<T> = std::result::Result<T, RelataError>;

// ========== Error Kind Taxonomy ==========

/// Canonical error kind taxonomy
///
/// Every error maps to exactly one kind. Each kind carries a stable code
/// used for programmatic handling and an HTTP-equivalent status used by the
/// error-mapper registry when producing caller-visible error documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Contribution after freeze, query before freeze, double init
    Lifecycle,
    /// Ambiguous or duplicate bindings, missing required contributions
    Configuration,
    /// Request cannot be routed to a registered repository
    Routing,
    /// Owner or target reference does not resolve to an entity
    NotFound,
    /// Request shape is incompatible with the declared relationship
    BadRequest,
    /// Many-replace failed after partial removal/addition
    PartialMutation,
    /// Repository-reported failures that fit no other kind
    Internal,
}

impl ErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Lifecycle => "ERR_LIFECYCLE",
            ErrorKind::Configuration => "ERR_CONFIGURATION",
            ErrorKind::Routing => "ERR_ROUTING",
            ErrorKind::NotFound => "ERR_NOT_FOUND",
            ErrorKind::BadRequest => "ERR_BAD_REQUEST",
            ErrorKind::PartialMutation => "ERR_PARTIAL_MUTATION",
            ErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// HTTP-equivalent status for caller-visible error documents
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::Lifecycle => 500,
            ErrorKind::Configuration => 500,
            ErrorKind::Routing => 404,
            ErrorKind::NotFound => 404,
            ErrorKind::BadRequest => 400,
            ErrorKind::PartialMutation => 500,
            ErrorKind::Internal => 500,
        }
    }
}

// ========== End Error Kind Taxonomy ==========

/// Comprehensive error taxonomy for registry and engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelataError {
    // ===== Lifecycle Errors =====
    /// A frozen-only facility was queried before initialization
    #[error("Not initialized: {what} is unavailable before init")]
    NotInitialized { what: String },

    /// init() was invoked a second time
    #[error("Module registry is already initialized and cannot be changed anymore")]
    AlreadyInitialized,

    /// A contribution arrived after the registry was frozen
    #[error("Contribution '{contribution}' from module '{module}' rejected: registry is frozen")]
    ContributionAfterFreeze { contribution: String, module: String },

    /// The registry behind a non-owning handle was dropped
    #[error("Resource registry was dropped behind this handle")]
    RegistryGone,

    // ===== Configuration Errors =====
    /// Two resource repositories claim the same resource type
    #[error("Duplicate resource repository for type '{resource_type}': contributed by '{first_module}' and '{second_module}'")]
    DuplicateResourceRepository {
        resource_type: ResourceType,
        first_module: String,
        second_module: String,
    },

    /// Two relationship repositories claim the same (type, field)
    #[error("Duplicate relationship repository for '{resource_type}.{field_name}': contributed by '{first_module}' and '{second_module}'")]
    DuplicateRelationshipRepository {
        resource_type: ResourceType,
        field_name: String,
        first_module: String,
        second_module: String,
    },

    /// A resource descriptor declares the same relationship field twice
    #[error("Duplicate relationship field '{field_name}' declared on resource type '{resource_type}'")]
    DuplicateRelationshipField {
        resource_type: ResourceType,
        field_name: String,
    },

    /// No contributed resource information builder accepted the type
    #[error("No resource information builder accepts type '{resource_type}'")]
    UnsupportedResourceType { resource_type: ResourceType },

    /// No contributed repository information builder accepted the instance
    #[error("No repository information builder accepts the repository contributed by '{module}'")]
    UnsupportedRepository { module: String },

    /// Zero security providers contributed
    #[error("Exactly one security provider must be contributed, found none")]
    MissingSecurityProvider,

    /// More than one security provider contributed
    #[error("Exactly one security provider must be contributed, found {count}")]
    MultipleSecurityProviders { count: usize },

    /// Following parent links from the type revisits a type
    #[error("Parent chain of resource type '{resource_type}' contains a cycle")]
    ParentCycle { resource_type: ResourceType },

    /// A declared parent type is not itself registered
    #[error("Resource type '{resource_type}' declares unknown parent type '{parent_type}'")]
    UnknownParentType {
        resource_type: ResourceType,
        parent_type: ResourceType,
    },

    // ===== Routing Errors =====
    /// Lookup of an unknown resource type
    #[error("Resource type '{resource_type}' is not registered")]
    NotRegistered { resource_type: ResourceType },

    /// Lookup of an unknown implementation identity
    #[error("No registry entry for implementation '{implementation_id}'")]
    ImplementationNotRegistered { implementation_id: ImplementationId },

    /// PATCH names a relationship field the owning type does not have
    #[error("Resource type '{resource_type}' has no relationship field '{field_name}'")]
    UnknownRelationship {
        resource_type: ResourceType,
        field_name: String,
    },

    /// The entry exists but carries no primary repository to resolve through
    #[error("Resource type '{resource_type}' has no primary repository")]
    MissingPrimaryRepository { resource_type: ResourceType },

    // ===== Not-Found Errors =====
    /// Owner or target reference did not resolve
    #[error("Resource not found: {resource_type}/{id}")]
    ResourceNotFound {
        resource_type: ResourceType,
        id: ResourceId,
    },

    // ===== Bad-Request Errors =====
    /// Reference type is neither a declared target nor a descendant of one
    #[error("Target reference {reference} is not affiliated with relationship '{field_name}' (declared targets: {declared:?})")]
    TargetTypeMismatch {
        field_name: String,
        reference: ResourceRef,
        declared: Vec<ResourceType>,
    },

    /// To-one patch against a to-many field or vice versa
    #[error("Relationship '{field_name}' has {expected:?} cardinality, the patch value does not match")]
    CardinalityMismatch {
        field_name: String,
        expected: Cardinality,
    },

    /// A repository filter vetoed the call
    #[error("Call rejected by repository filter: {reason}")]
    FilterVeto { reason: String },

    // ===== Partial Mutation =====
    /// Many-replace failed midway; state is partially mutated and NOT rolled back
    #[error("Relationship replace on {resource_type}/{id}.{field_name} failed after partial mutation (removed {removed:?}, added {added:?}, failed at {failed})")]
    PartialReplace {
        resource_type: ResourceType,
        id: ResourceId,
        field_name: String,
        /// Target ids removed before the failure
        removed: Vec<ResourceId>,
        /// Target ids added before the failure
        added: Vec<ResourceId>,
        /// The target whose addition (or whose removal batch) failed
        failed: ResourceId,
        #[source]
        source: Box<RelataError>,
    },

    // ===== Internal =====
    /// Opaque repository failure
    #[error("Repository failure: {message}")]
    Repository { message: String },
}

impl RelataError {
    /// Classify this error into the stable kind taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelataError::NotInitialized { .. }
            | RelataError::AlreadyInitialized
            | RelataError::ContributionAfterFreeze { .. }
            | RelataError::RegistryGone => ErrorKind::Lifecycle,

            RelataError::DuplicateResourceRepository { .. }
            | RelataError::DuplicateRelationshipRepository { .. }
            | RelataError::DuplicateRelationshipField { .. }
            | RelataError::UnsupportedResourceType { .. }
            | RelataError::UnsupportedRepository { .. }
            | RelataError::MissingSecurityProvider
            | RelataError::MultipleSecurityProviders { .. }
            | RelataError::ParentCycle { .. }
            | RelataError::UnknownParentType { .. } => ErrorKind::Configuration,

            RelataError::NotRegistered { .. }
            | RelataError::ImplementationNotRegistered { .. }
            | RelataError::UnknownRelationship { .. }
            | RelataError::MissingPrimaryRepository { .. } => ErrorKind::Routing,

            RelataError::ResourceNotFound { .. } => ErrorKind::NotFound,

            RelataError::TargetTypeMismatch { .. }
            | RelataError::CardinalityMismatch { .. }
            | RelataError::FilterVeto { .. } => ErrorKind::BadRequest,

            RelataError::PartialReplace { .. } => ErrorKind::PartialMutation,

            RelataError::Repository { .. } => ErrorKind::Internal,
        }
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// HTTP-equivalent status for this error
    pub fn http_status(&self) -> u16 {
        self.kind().http_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_distinct() {
        let kinds = [
            ErrorKind::Lifecycle,
            ErrorKind::Configuration,
            ErrorKind::Routing,
            ErrorKind::NotFound,
            ErrorKind::BadRequest,
            ErrorKind::PartialMutation,
            ErrorKind::Internal,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in kinds.iter().skip(i + 1) {
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = RelataError::ResourceNotFound {
            resource_type: ResourceType::new("tasks"),
            id: ResourceId::new("1"),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn test_target_mismatch_is_bad_request() {
        let err = RelataError::TargetTypeMismatch {
            field_name: "project".to_string(),
            reference: ResourceRef::new("users", "1"),
            declared: vec![ResourceType::new("projects")],
        };
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_partial_replace_carries_source() {
        let source = RelataError::Repository {
            message: "disk full".to_string(),
        };
        let err = RelataError::PartialReplace {
            resource_type: ResourceType::new("users"),
            id: ResourceId::new("1"),
            field_name: "assignedProjects".to_string(),
            removed: vec![ResourceId::new("5")],
            added: vec![],
            failed: ResourceId::new("6"),
            source: Box::new(source.clone()),
        };
        assert_eq!(err.kind(), ErrorKind::PartialMutation);
        match err {
            RelataError::PartialReplace { source: s, .. } => assert_eq!(*s, source),
            _ => panic!("expected PartialReplace"),
        }
    }
}

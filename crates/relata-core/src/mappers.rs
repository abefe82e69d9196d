//! Error-mapper registry: raw failures → caller-visible error documents
//!
//! Modules contribute mapper lookups; the registry is produced once, at
//! freeze time, from the union of all contributed lookups. The union is a
//! set keyed by mapper id, so duplicate registrations of the same mapper
//! are idempotent rather than ordered. When no contributed mapper accepts
//! an error, the kind-derived default document is produced instead.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorKind, RelataError};

/// Caller-visible error document with an HTTP-equivalent status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub status: u16,
    pub code: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorDocument {
    /// The kind-derived default document for an error
    pub fn from_error(error: &RelataError) -> Self {
        let kind = error.kind();
        Self {
            status: kind.http_status(),
            code: kind.code().to_string(),
            title: default_title(kind).to_string(),
            detail: Some(error.to_string()),
        }
    }
}

fn default_title(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Lifecycle => "Lifecycle violation",
        ErrorKind::Configuration => "Configuration error",
        ErrorKind::Routing => "Unroutable request",
        ErrorKind::NotFound => "Not found",
        ErrorKind::BadRequest => "Bad request",
        ErrorKind::PartialMutation => "Partially applied mutation",
        ErrorKind::Internal => "Internal error",
    }
}

/// Maps raw failures it accepts into error documents
pub trait ErrorMapper: Send + Sync {
    /// Stable identity used for set-union deduplication
    fn mapper_id(&self) -> &'static str;

    /// Whether this mapper handles the given error
    fn accepts(&self, error: &RelataError) -> bool;

    /// Produce the caller-visible document
    fn map(&self, error: &RelataError) -> ErrorDocument;
}

/// Module-contributed source of error mappers
pub trait ErrorMapperLookup: Send + Sync {
    fn error_mappers(&self) -> Vec<Arc<dyn ErrorMapper>>;
}

/// Lookup wrapping a single mapper; used by the contribution convenience
pub struct SingleErrorMapperLookup {
    mapper: Arc<dyn ErrorMapper>,
}

impl SingleErrorMapperLookup {
    pub fn new(mapper: Arc<dyn ErrorMapper>) -> Self {
        Self { mapper }
    }
}

impl ErrorMapperLookup for SingleErrorMapperLookup {
    fn error_mappers(&self) -> Vec<Arc<dyn ErrorMapper>> {
        vec![self.mapper.clone()]
    }
}

/// Frozen registry of contributed error mappers
pub struct ErrorMapperRegistry {
    mappers: Vec<Arc<dyn ErrorMapper>>,
}

impl ErrorMapperRegistry {
    /// Union all lookups; duplicates by mapper id collapse to the first
    pub(crate) fn build(lookups: &[Arc<dyn ErrorMapperLookup>]) -> Self {
        let mut seen: HashSet<&'static str> = HashSet::new();
        let mut mappers = Vec::new();
        for lookup in lookups {
            for mapper in lookup.error_mappers() {
                if seen.insert(mapper.mapper_id()) {
                    mappers.push(mapper);
                }
            }
        }
        Self { mappers }
    }

    /// Number of distinct registered mappers
    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    /// First registered mapper accepting the error, if any
    pub fn find_mapper(&self, error: &RelataError) -> Option<&dyn ErrorMapper> {
        self.mappers
            .iter()
            .find(|mapper| mapper.accepts(error))
            .map(|mapper| mapper.as_ref())
    }

    /// Translate an error, falling back to the kind-derived default
    pub fn to_document(&self, error: &RelataError) -> ErrorDocument {
        match self.find_mapper(error) {
            Some(mapper) => mapper.map(error),
            None => ErrorDocument::from_error(error),
        }
    }
}

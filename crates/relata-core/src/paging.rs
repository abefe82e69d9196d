//! Paging behavior carried by registry entries
//!
//! Each registry entry carries a default paging specification applied to
//! collection reads when the request does not supply its own.

use serde::{Deserialize, Serialize};

/// Offset/limit paging window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingSpec {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl PagingSpec {
    /// Unbounded window starting at the beginning
    pub fn unbounded() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }

    /// Window with an explicit offset and limit
    pub fn new(offset: usize, limit: Option<usize>) -> Self {
        Self { offset, limit }
    }

    /// Apply the window to an already-ordered collection
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

impl Default for PagingSpec {
    fn default() -> Self {
        Self::unbounded()
    }
}

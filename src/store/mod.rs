//! Document store module
//!
//! The engine never talks to a database directly. Everything it needs from a
//! store is the `DocumentStore` trait: a find with sort/limit/projection, an
//! aggregation, a count and a query-plan explanation.
//!
//! # Overview
//!
//! - `DocumentStore` - the consumed store interface
//! - `FindRequest` / `Populate` - find-style read parameters
//! - `MemoryStore` - in-memory store evaluating the query and pipeline subset
//!   the engine generates (plus the common caller stages)

mod eval;
mod memory;

pub use eval::{apply_projection, matches_filter, sort_documents};
pub use memory::{MemoryStore, StoreCall};

use crate::error::Result;
use crate::types::{Document, Stage, Verbosity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Find Request
// ============================================================================

/// Parameters of a find-style read
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindRequest {
    /// Query document
    pub filter: Document,
    /// Optional projection document
    pub projection: Option<Document>,
    /// Ordered sort document
    pub sort: Document,
    /// Maximum rows to return, `0` meaning no limit
    pub limit: u64,
    /// References to resolve on the returned rows
    pub populate: Vec<Populate>,
}

/// Replace a reference field with the document it points to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Populate {
    /// Field holding the reference (or an array of references)
    pub path: String,
    /// Collection holding the referenced documents
    pub from: String,
    /// Field of the referenced documents matched against the reference
    #[serde(default = "default_foreign_field")]
    pub foreign_field: String,
}

fn default_foreign_field() -> String {
    "_id".to_string()
}

impl Populate {
    /// Populate `path` from `from` by `_id`
    pub fn new(path: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            from: from.into(),
            foreign_field: default_foreign_field(),
        }
    }
}

// ============================================================================
// Store Trait
// ============================================================================

/// Read interface consumed by the pagination engine
///
/// Connection management, retries and transactions belong to the
/// implementation; the engine propagates every error unchanged.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a find with sort, limit, projection and populate applied
    async fn find(&self, request: &FindRequest) -> Result<Vec<Document>>;

    /// Run an aggregation pipeline
    async fn aggregate(&self, pipeline: &[Stage]) -> Result<Vec<Document>>;

    /// Count documents matching `filter`
    async fn count_documents(&self, filter: &Document) -> Result<u64>;

    /// Describe how the store would execute `request`
    async fn explain(&self, request: &FindRequest, verbosity: Verbosity) -> Result<Document>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn find(&self, request: &FindRequest) -> Result<Vec<Document>> {
        (**self).find(request).await
    }

    async fn aggregate(&self, pipeline: &[Stage]) -> Result<Vec<Document>> {
        (**self).aggregate(pipeline).await
    }

    async fn count_documents(&self, filter: &Document) -> Result<u64> {
        (**self).count_documents(filter).await
    }

    async fn explain(&self, request: &FindRequest, verbosity: Verbosity) -> Result<Document> {
        (**self).explain(request, verbosity).await
    }
}

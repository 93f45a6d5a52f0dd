//! Window resolution and over-fetching reads

use super::types::{FindQuery, PaginateOptions};
use crate::config::PaginateConfig;
use crate::cursor::{Cursor, CursorCodec};
use crate::error::Result;
use crate::sort::SortPlan;
use crate::store::{DocumentStore, FindRequest};
use crate::types::{Document, Stage, Traversal};

/// Number of rows a page may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// At most `n` items per page
    Bounded(u64),
    /// Every matching item on one page
    Unbounded,
}

impl Window {
    /// Rows to request from the store: one extra to detect a further page
    pub fn fetch_limit(self) -> Option<u64> {
        match self {
            Self::Bounded(n) => Some(n.saturating_add(1)),
            Self::Unbounded => None,
        }
    }

    /// Store-level limit, `0` meaning no limit
    pub fn store_limit(self) -> u64 {
        self.fetch_limit().unwrap_or(0)
    }

    /// Maximum items returned to the caller
    pub fn page_size(self) -> Option<u64> {
        match self {
            Self::Bounded(n) => Some(n),
            Self::Unbounded => None,
        }
    }
}

/// Resolve the requested limit against the configuration
///
/// `0` fetches everything unless unbounded fetches are forbidden, in which
/// case it silently becomes the default limit, like an absent or negative
/// limit does.
pub fn resolve_window(limit: Option<i64>, config: &PaginateConfig) -> Window {
    match limit {
        Some(n) if n > 0 => Window::Bounded(n as u64),
        Some(0) if !config.forbid_unbounded_fetch => Window::Unbounded,
        Some(0) => {
            tracing::debug!(
                default_limit = config.default_limit,
                "unbounded fetch forbidden, using default limit"
            );
            Window::Bounded(config.default_limit)
        }
        Some(n) => {
            tracing::warn!(limit = n, "negative limit, using default limit");
            Window::Bounded(config.default_limit)
        }
        None => Window::Bounded(config.default_limit),
    }
}

// ============================================================================
// Page Request
// ============================================================================

/// Everything resolved from the options before any store call
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Validated ordering
    pub plan: SortPlan,
    /// Walk direction
    pub traversal: Traversal,
    /// Decoded anchor, absent on the first page
    pub anchor: Option<Cursor>,
    /// Rows per page
    pub window: Window,
}

impl PageRequest {
    /// Validate the config and options, build the plan and decode the anchor
    pub fn prepare(
        options: &PaginateOptions,
        config: &PaginateConfig,
        codec: &dyn CursorCodec,
    ) -> Result<Self> {
        config.validate()?;
        options.validate()?;
        let plan = SortPlan::resolve(options.sort.clone(), config)?;
        let anchor = options
            .anchor_token()
            .map(|token| codec.decode(&plan, token))
            .transpose()?;

        Ok(Self {
            plan,
            traversal: options.traversal(),
            anchor,
            window: resolve_window(options.limit, config),
        })
    }

    /// Whether a cursor anchored this request
    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }

    /// Find request over-fetching by one row in traversal order
    pub fn find_request(&self, query: Document, find: &FindQuery) -> FindRequest {
        FindRequest {
            filter: query,
            projection: find.projection.clone(),
            sort: self.plan.sort_spec(self.traversal),
            limit: self.window.store_limit(),
            populate: find.populate.clone(),
        }
    }
}

// ============================================================================
// Fetching
// ============================================================================

/// Run a windowed find
pub async fn fetch_find<S>(store: &S, request: &FindRequest) -> Result<Vec<Document>>
where
    S: DocumentStore + ?Sized,
{
    let rows = store.find(request).await?;
    tracing::trace!(rows = rows.len(), limit = request.limit, "window fetched");
    Ok(rows)
}

/// Run a windowed pipeline
pub async fn fetch_pipeline<S>(store: &S, pipeline: &[Stage]) -> Result<Vec<Document>>
where
    S: DocumentStore + ?Sized,
{
    let rows = store.aggregate(pipeline).await?;
    tracing::trace!(rows = rows.len(), stages = pipeline.len(), "window fetched");
    Ok(rows)
}

//! Paged find, aggregate and explain operations

use super::assemble::assemble;
use super::types::{FindQuery, PaginateOptions, PaginateResult};
use super::window::{fetch_find, fetch_pipeline, PageRequest};
use crate::config::PaginateConfig;
use crate::cursor::{Base64JsonCodec, CursorCodec};
use crate::error::{Error, Result};
use crate::query::{
    build_directional_predicate, compile_count_pipeline, compile_find_query, compile_pipeline,
    COUNT_FIELD,
};
use crate::store::DocumentStore;
use crate::types::{Document, Stage, Verbosity};
use bson::Bson;
use std::future::Future;
use std::sync::Arc;

// ============================================================================
// Pager
// ============================================================================

/// Store, configuration and cursor codec bundled for repeated paging
pub struct Pager<S> {
    store: S,
    config: PaginateConfig,
    codec: Arc<dyn CursorCodec>,
}

impl<S: DocumentStore> Pager<S> {
    /// Create a pager with the default configuration and codec
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: PaginateConfig::default(),
            codec: Arc::new(Base64JsonCodec::new()),
        }
    }

    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: PaginateConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the cursor codec
    #[must_use]
    pub fn with_codec(mut self, codec: impl CursorCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Get the store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &PaginateConfig {
        &self.config
    }

    /// Get the cursor codec
    pub fn codec(&self) -> &dyn CursorCodec {
        self.codec.as_ref()
    }

    /// Page through a find
    pub async fn find(
        &self,
        options: &PaginateOptions,
        query: &FindQuery,
    ) -> Result<PaginateResult> {
        run_find(&self.store, &self.config, self.codec(), options, query).await
    }

    /// Page through an aggregation pipeline
    pub async fn aggregate(
        &self,
        options: &PaginateOptions,
        pre: &[Stage],
        post: &[Stage],
    ) -> Result<PaginateResult> {
        run_aggregate(&self.store, &self.config, self.codec(), options, pre, post).await
    }

    /// Explain the find a page would run
    pub async fn explain(
        &self,
        options: &PaginateOptions,
        verbosity: Verbosity,
        query: &FindQuery,
    ) -> Result<Document> {
        run_explain(&self.store, &self.config, self.codec(), options, verbosity, query).await
    }
}

// ============================================================================
// Free Functions
// ============================================================================

/// Return one page of a find using the default cursor codec
pub async fn find_paged<S>(
    store: &S,
    config: &PaginateConfig,
    options: &PaginateOptions,
    query: &FindQuery,
) -> Result<PaginateResult>
where
    S: DocumentStore + ?Sized,
{
    run_find(store, config, &Base64JsonCodec, options, query).await
}

/// Return one page of an aggregation using the default cursor codec
///
/// The pagination block runs after `pre` and before `post`.
pub async fn aggregate_paged<S>(
    store: &S,
    config: &PaginateConfig,
    options: &PaginateOptions,
    pre: &[Stage],
    post: &[Stage],
) -> Result<PaginateResult>
where
    S: DocumentStore + ?Sized,
{
    run_aggregate(store, config, &Base64JsonCodec, options, pre, post).await
}

/// Explain the windowed find without returning a page
pub async fn explain_paged<S>(
    store: &S,
    config: &PaginateConfig,
    options: &PaginateOptions,
    verbosity: Verbosity,
    query: &FindQuery,
) -> Result<Document>
where
    S: DocumentStore + ?Sized,
{
    run_explain(store, config, &Base64JsonCodec, options, verbosity, query).await
}

// ============================================================================
// Execution
// ============================================================================

async fn run_find<S>(
    store: &S,
    config: &PaginateConfig,
    codec: &dyn CursorCodec,
    options: &PaginateOptions,
    query: &FindQuery,
) -> Result<PaginateResult>
where
    S: DocumentStore + ?Sized,
{
    let page = PageRequest::prepare(options, config, codec)?;
    let predicate = build_directional_predicate(&page.plan, page.anchor.as_ref(), page.traversal)?;
    let compiled = compile_find_query(query.filter.as_ref(), predicate);
    let request = page.find_request(compiled, query);
    let count_filter = query.filter.clone().unwrap_or_default();

    tracing::debug!(
        query = %request.filter,
        sort = %request.sort,
        limit = request.limit,
        "paged find"
    );

    let count = async {
        if config.suppress_total_count {
            Ok(None)
        } else {
            store.count_documents(&count_filter).await.map(Some)
        }
    };
    let (items, total_count) = with_timeout(config, async {
        futures::try_join!(fetch_find(store, &request), count)
    })
    .await?;

    assemble(items, &page, codec, total_count)
}

async fn run_aggregate<S>(
    store: &S,
    config: &PaginateConfig,
    codec: &dyn CursorCodec,
    options: &PaginateOptions,
    pre: &[Stage],
    post: &[Stage],
) -> Result<PaginateResult>
where
    S: DocumentStore + ?Sized,
{
    let page = PageRequest::prepare(options, config, codec)?;
    let predicate = build_directional_predicate(&page.plan, page.anchor.as_ref(), page.traversal)?;
    let pipeline = compile_pipeline(pre, &page.plan, page.traversal, predicate, page.window, post);

    tracing::debug!(stages = pipeline.len(), "paged aggregate");
    tracing::trace!(pipeline = ?pipeline, "compiled pipeline");

    let count = async {
        if config.suppress_total_count {
            return Ok(None);
        }
        let rows = store.aggregate(&compile_count_pipeline(pre)).await?;
        Ok::<_, Error>(Some(count_from_rows(&rows)))
    };
    let (items, total_count) = with_timeout(config, async {
        futures::try_join!(fetch_pipeline(store, &pipeline), count)
    })
    .await?;

    assemble(items, &page, codec, total_count)
}

async fn run_explain<S>(
    store: &S,
    config: &PaginateConfig,
    codec: &dyn CursorCodec,
    options: &PaginateOptions,
    verbosity: Verbosity,
    query: &FindQuery,
) -> Result<Document>
where
    S: DocumentStore + ?Sized,
{
    let page = PageRequest::prepare(options, config, codec)?;
    let predicate = build_directional_predicate(&page.plan, page.anchor.as_ref(), page.traversal)?;
    let compiled = compile_find_query(query.filter.as_ref(), predicate);
    let request = page.find_request(compiled, query);

    tracing::debug!(verbosity = verbosity.as_str(), "paged explain");
    with_timeout(config, store.explain(&request, verbosity)).await
}

/// Count from the single-row `$group` result; no rows means zero
pub(crate) fn count_from_rows(rows: &[Document]) -> u64 {
    let count = match rows.first().and_then(|row| row.get(COUNT_FIELD)) {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(f)) => *f as i64,
        _ => 0,
    };
    u64::try_from(count).unwrap_or(0)
}

/// Bound the store round trips by the configured timeout
async fn with_timeout<T, F>(config: &PaginateConfig, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match config.store_timeout() {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "store call timed out");
            Error::Timeout {
                timeout_ms: limit.as_millis() as u64,
            }
        })?,
        None => fut.await,
    }
}

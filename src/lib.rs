//! # Keyset Pager
//!
//! Cursor-based (keyset) pagination for document stores.
//!
//! ## Features
//!
//! - **Stable Ordering**: Every sort gets a unique tie-break field appended
//! - **Opaque Cursors**: Versioned tokens bound to the sort they were issued under
//! - **Bidirectional**: Walk forward with `after`, backward with `before`
//! - **Find and Aggregate**: Pagination layered onto filters or pipelines
//! - **Explain**: Inspect the windowed query a page would run
//! - **BSON Documents**: Filters, stages and items are `bson::Document`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bson::doc;
//! use keyset_pager::{
//!     find_paged, FindQuery, MemoryStore, PaginateConfig, PaginateOptions, SortField,
//! };
//!
//! #[tokio::main]
//! async fn main() -> keyset_pager::Result<()> {
//!     let store = MemoryStore::new("posts", load_posts());
//!     let config = PaginateConfig::default();
//!     let options = PaginateOptions::new(vec![SortField::desc("createdAt")]).with_limit(10);
//!
//!     let query = FindQuery::new().filter(doc! { "published": true });
//!
//!     let page = find_paged(&store, &config, &options, &query).await?;
//!     if let Some(end) = page.page_info.end_cursor {
//!         let next = find_paged(&store, &config, &options.clone().after(end), &query).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │        find_paged / aggregate_paged / explain_paged          │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────┬───────────┬──────┴──────┬────────────┬────────────┐
//! │   Sort   │  Cursor   │    Query    │  Paginate  │   Store    │
//! ├──────────┼───────────┼─────────────┼────────────┼────────────┤
//! │ Parse    │ Encode    │ Predicate   │ Window     │ Find       │
//! │ Tie-break│ Decode    │ Find query  │ Fetch n+1  │ Aggregate  │
//! │ Reverse  │ Verify    │ Pipeline    │ Assemble   │ Count      │
//! └──────────┴───────────┴─────────────┴────────────┴────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Sortable values and document path access
pub mod value;

/// Sort parsing and plans
pub mod sort;

/// Cursor tokens
pub mod cursor;

/// Predicate and pipeline compilation
pub mod query;

/// Paged operations
pub mod paginate;

/// Document store abstraction and in-memory store
pub mod store;

/// Pagination configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::PaginateConfig;
pub use cursor::{Base64JsonCodec, Cursor, CursorCodec};
pub use paginate::{
    aggregate_paged, explain_paged, find_paged, FindQuery, PageInfo, PaginateOptions,
    PaginateResult, Pager,
};
pub use sort::{parse_sort, SortField, SortPlan};
pub use store::{DocumentStore, FindRequest, MemoryStore, Populate};
pub use value::SortValue;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

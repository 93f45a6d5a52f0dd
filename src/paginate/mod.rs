//! Paged reads over a document store
//!
//! # Overview
//!
//! The paginate module provides:
//! - `find_paged` / `aggregate_paged` / `explain_paged` - One-shot paged operations
//! - `Pager` - Store, config and cursor codec bundled for repeated use
//! - `PaginateOptions` / `PaginateResult` - Request options and page envelope
//! - `Window` - Resolved page size, over-fetched by one row to detect more pages
//!
//! # Example
//!
//! ```ignore
//! use keyset_pager::paginate::{find_paged, FindQuery, PaginateOptions};
//! use keyset_pager::sort::SortField;
//!
//! let options = PaginateOptions::new(vec![SortField::desc("createdAt")]).with_limit(10);
//! let page = find_paged(&store, &config, &options, &FindQuery::new()).await?;
//! let next = options.clone().after(page.page_info.end_cursor.unwrap());
//! ```

mod assemble;
mod pager;
mod types;
mod window;

pub use assemble::assemble;
pub use pager::{aggregate_paged, explain_paged, find_paged, Pager};
pub use types::{FindQuery, PageInfo, PaginateOptions, PaginateResult};
pub use window::{fetch_find, fetch_pipeline, resolve_window, PageRequest, Window};

#[cfg(test)]
mod tests;

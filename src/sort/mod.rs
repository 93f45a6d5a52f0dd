//! Sort plan module
//!
//! Normalizes a requested ordering into a `SortPlan` that ends in a unique
//! tie-break field, so every pair of documents compares strictly.
//!
//! # Overview
//!
//! - `SortField` - one `(path, direction)` entry, parsed from strings or JSON
//! - `SortPlan` - immutable, validated field list shared by the cursor codec,
//!   the predicate builder and the compilers for one request

mod plan;

pub use plan::{parse_sort, sort_fields_from_json, SortField, SortPlan, DEFAULT_TIE_BREAK};

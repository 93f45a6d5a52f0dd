//! Query generation module
//!
//! Turns a sort plan and an optional anchor cursor into store queries.
//!
//! # Overview
//!
//! - `build_directional_predicate` - the seek condition selecting documents
//!   strictly after (or before) the anchor in plan order
//! - `compile_find_query` - predicate AND caller filter, for find-style reads
//! - `compile_pipeline` - the same semantics as aggregation stages placed
//!   between caller pre-stages and post-stages
//! - `compile_count_pipeline` - total count over the caller's pre-stages

mod compiler;
mod predicate;

pub(crate) use compiler::limit_value;
pub use compiler::{compile_count_pipeline, compile_find_query, compile_pipeline, COUNT_FIELD};
pub use predicate::build_directional_predicate;

#[cfg(test)]
mod tests;

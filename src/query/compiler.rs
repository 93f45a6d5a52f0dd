//! Find query and aggregation pipeline compilers

use crate::paginate::Window;
use crate::sort::SortPlan;
use crate::types::{Document, Stage, Traversal};
use bson::{doc, Bson};

/// Field holding the result of the count pipeline
pub const COUNT_FIELD: &str = "count";

/// Combine the directional predicate with the caller's filter
///
/// Returns `{"$and": [predicate, filter]}`; a missing filter matches everything.
pub fn compile_find_query(filter: Option<&Document>, predicate: Document) -> Document {
    let filter = filter.cloned().unwrap_or_default();
    doc! { "$and": [predicate, filter] }
}

/// Layer pagination onto a caller pipeline
///
/// Produces `pre ++ [$match] ++ [$sort] ++ [$limit n+1]? ++ post`. The
/// pagination block sits after `pre` so that joins in `pre` can materialize
/// sort fields, and before `post` so that projections only touch the window.
pub fn compile_pipeline(
    pre: &[Stage],
    plan: &SortPlan,
    traversal: Traversal,
    predicate: Document,
    window: Window,
    post: &[Stage],
) -> Vec<Stage> {
    let mut pipeline = Vec::with_capacity(pre.len() + post.len() + 3);
    pipeline.extend_from_slice(pre);
    pipeline.push(doc! { "$match": predicate });
    pipeline.push(doc! { "$sort": plan.sort_spec(traversal) });
    if let Some(limit) = window.fetch_limit() {
        pipeline.push(doc! { "$limit": limit_value(limit) });
    }
    pipeline.extend_from_slice(post);
    pipeline
}

/// Count the documents produced by `pre`
pub fn compile_count_pipeline(pre: &[Stage]) -> Vec<Stage> {
    let mut pipeline = pre.to_vec();
    pipeline.push(doc! { "$group": { "_id": Bson::Null, COUNT_FIELD: { "$sum": 1 } } });
    pipeline
}

/// BSON has no unsigned integers
pub(crate) fn limit_value(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

//! Directional (seek) predicate construction
//!
//! For a plan `[(p1,d1)..(pk,dk)]` and anchor `(a1..ak)` the predicate is the
//! lexicographic comparison
//!
//! ```text
//! OR over i in 1..=k: AND(p_j == a_j for j < i) AND (p_i >eff a_i)
//! ```
//!
//! where `>eff` is `$gt` when the field's effective direction is ascending and
//! `$lt` when it is descending. Walking backward flips every direction.
//!
//! Null and missing values sort before every other type, and range operators
//! never match them, so null anchors get their own conditions:
//!
//! - ascending past a null anchor: `p_i != null`
//! - descending past a null anchor: nothing, the branch is dropped
//! - descending past any other anchor: `p_i < a_i OR p_i == null`

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::sort::SortPlan;
use crate::types::{Document, SortDirection, Traversal};
use crate::value::SortValue;
use bson::{doc, Bson};

/// Build the condition selecting documents strictly beyond `anchor`
///
/// Without an anchor (first page) the predicate is the empty document, which
/// matches everything.
pub fn build_directional_predicate(
    plan: &SortPlan,
    anchor: Option<&Cursor>,
    traversal: Traversal,
) -> Result<Document> {
    let Some(anchor) = anchor else {
        return Ok(Document::new());
    };

    if anchor.values.len() != plan.len() {
        return Err(Error::CursorSchemaMismatch {
            expected: plan.signature().join(", "),
            actual: format!("{} values", anchor.values.len()),
        });
    }

    let fields = plan.fields();
    let mut branches = Vec::with_capacity(fields.len());

    for (i, field) in fields.iter().enumerate() {
        let direction = traversal.apply(field.direction);
        let Some(range) = beyond(&field.path, &anchor.values[i], direction) else {
            continue;
        };

        let mut clause = Document::new();
        for (prefix, value) in fields[..i].iter().zip(&anchor.values) {
            clause.insert(prefix.path.as_str(), doc! { "$eq": value.as_bson().clone() });
        }
        for (key, condition) in range {
            clause.insert(key, condition);
        }
        branches.push(clause);
    }

    if branches.len() > 1 {
        return Ok(doc! { "$or": branches });
    }
    // Empty only when every field is descending past a null anchor
    Ok(branches
        .pop()
        .unwrap_or_else(|| doc! { plan.tie_break(): { "$in": [] } }))
}

/// Condition on one field selecting values strictly past `anchor`
fn beyond(path: &str, anchor: &SortValue, direction: SortDirection) -> Option<Document> {
    let value = anchor.as_bson().clone();
    match (direction, anchor.is_null()) {
        (SortDirection::Ascending, true) => Some(doc! { path: { "$ne": Bson::Null } }),
        (SortDirection::Ascending, false) => Some(doc! { path: { "$gt": value } }),
        (SortDirection::Descending, true) => None,
        (SortDirection::Descending, false) => Some(doc! {
            "$or": [
                { path: { "$lt": value } },
                { path: Bson::Null },
            ]
        }),
    }
}

//! Tests for query module

use super::*;
use crate::cursor::Cursor;
use crate::error::Error;
use crate::paginate::Window;
use crate::sort::{SortField, SortPlan};
use crate::types::{CursorDirection, Traversal};
use crate::value::SortValue;
use bson::oid::ObjectId;
use bson::{doc, Bson};
use pretty_assertions::assert_eq;

fn two_field_plan() -> SortPlan {
    SortPlan::build(vec![SortField::desc("createdAt")], "_id").unwrap()
}

fn anchor(values: Vec<Bson>) -> Cursor {
    let values = values
        .iter()
        .map(|v| SortValue::from_bson(v).unwrap())
        .collect();
    Cursor::new(CursorDirection::After, values)
}

// ============================================================================
// Directional Predicate Tests
// ============================================================================

#[test]
fn test_predicate_without_anchor_is_empty() {
    let predicate =
        build_directional_predicate(&two_field_plan(), None, Traversal::Forward).unwrap();
    assert_eq!(predicate, doc! {});
}

#[test]
fn test_predicate_forward_two_fields() {
    let cursor = anchor(vec![Bson::Int32(100), Bson::Int32(7)]);
    let predicate =
        build_directional_predicate(&two_field_plan(), Some(&cursor), Traversal::Forward)
            .unwrap();
    assert_eq!(
        predicate,
        doc! {
            "$or": [
                { "$or": [{ "createdAt": { "$lt": 100 } }, { "createdAt": null }] },
                { "createdAt": { "$eq": 100 }, "_id": { "$gt": 7 } },
            ]
        }
    );
}

#[test]
fn test_predicate_backward_flips_operators() {
    let cursor = anchor(vec![Bson::Int32(100), Bson::Int32(7)]);
    let predicate =
        build_directional_predicate(&two_field_plan(), Some(&cursor), Traversal::Backward)
            .unwrap();
    assert_eq!(
        predicate,
        doc! {
            "$or": [
                { "createdAt": { "$gt": 100 } },
                {
                    "createdAt": { "$eq": 100 },
                    "$or": [{ "_id": { "$lt": 7 } }, { "_id": null }],
                },
            ]
        }
    );
}

#[test]
fn test_predicate_three_fields_prefix_equalities() {
    let plan = SortPlan::build(vec![SortField::asc("a"), SortField::desc("b")], "_id").unwrap();
    let cursor = anchor(vec![Bson::from("x"), Bson::Double(1.5), Bson::Int32(3)]);
    let predicate = build_directional_predicate(&plan, Some(&cursor), Traversal::Forward).unwrap();
    assert_eq!(
        predicate,
        doc! {
            "$or": [
                { "a": { "$gt": "x" } },
                { "a": { "$eq": "x" }, "$or": [{ "b": { "$lt": 1.5 } }, { "b": null }] },
                { "a": { "$eq": "x" }, "b": { "$eq": 1.5 }, "_id": { "$gt": 3 } },
            ]
        }
    );
}

#[test]
fn test_predicate_single_tie_break_field() {
    let plan = SortPlan::build(vec![SortField::asc("_id")], "_id").unwrap();
    let oid = ObjectId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap();
    let cursor = anchor(vec![Bson::ObjectId(oid)]);

    let forward = build_directional_predicate(&plan, Some(&cursor), Traversal::Forward).unwrap();
    assert_eq!(forward, doc! { "_id": { "$gt": oid } });

    let backward = build_directional_predicate(&plan, Some(&cursor), Traversal::Backward).unwrap();
    assert_eq!(
        backward,
        doc! { "$or": [{ "_id": { "$lt": oid } }, { "_id": null }] }
    );
}

#[test]
fn test_predicate_null_anchor_forward() {
    let plan = SortPlan::build(vec![SortField::asc("score")], "_id").unwrap();
    let cursor = anchor(vec![Bson::Null, Bson::Int32(2)]);

    let predicate = build_directional_predicate(&plan, Some(&cursor), Traversal::Forward).unwrap();
    assert_eq!(
        predicate,
        doc! {
            "$or": [
                { "score": { "$ne": null } },
                { "score": { "$eq": null }, "_id": { "$gt": 2 } },
            ]
        }
    );
}

#[test]
fn test_predicate_null_anchor_backward_drops_branch() {
    let plan = SortPlan::build(vec![SortField::asc("score")], "_id").unwrap();
    let cursor = anchor(vec![Bson::Null, Bson::Int32(2)]);

    let predicate =
        build_directional_predicate(&plan, Some(&cursor), Traversal::Backward).unwrap();
    assert_eq!(
        predicate,
        doc! {
            "score": { "$eq": null },
            "$or": [{ "_id": { "$lt": 2 } }, { "_id": null }],
        }
    );
}

#[test]
fn test_predicate_all_null_descending_matches_nothing() {
    let plan = SortPlan::build(vec![SortField::desc("_id")], "_id").unwrap();
    let cursor = anchor(vec![Bson::Null]);

    let predicate = build_directional_predicate(&plan, Some(&cursor), Traversal::Forward).unwrap();
    assert_eq!(predicate, doc! { "_id": { "$in": [] } });
}

#[test]
fn test_predicate_rejects_wrong_arity() {
    let cursor = anchor(vec![Bson::Int32(1)]);
    let err = build_directional_predicate(&two_field_plan(), Some(&cursor), Traversal::Forward)
        .unwrap_err();
    assert!(matches!(err, Error::CursorSchemaMismatch { .. }));
}

// ============================================================================
// Find Query Tests
// ============================================================================

#[test]
fn test_compile_find_query() {
    let filter = doc! { "status": "open" };
    let query = compile_find_query(Some(&filter), doc! { "_id": { "$gt": 1 } });
    assert_eq!(
        query,
        doc! { "$and": [{ "_id": { "$gt": 1 } }, { "status": "open" }] }
    );

    let query = compile_find_query(None, doc! {});
    assert_eq!(query, doc! { "$and": [{}, {}] });
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[test]
fn test_compile_pipeline_places_block_between_pre_and_post() {
    let pre = vec![doc! {
        "$lookup": {
            "from": "authors",
            "localField": "authorId",
            "foreignField": "_id",
            "as": "author",
        }
    }];
    let post = vec![doc! { "$project": { "title": 1 } }];
    let predicate = doc! { "createdAt": { "$lt": 5 } };

    let pipeline = compile_pipeline(
        &pre,
        &two_field_plan(),
        Traversal::Forward,
        predicate.clone(),
        Window::Bounded(10),
        &post,
    );

    assert_eq!(
        pipeline,
        vec![
            pre[0].clone(),
            doc! { "$match": predicate },
            doc! { "$sort": { "createdAt": -1, "_id": 1 } },
            doc! { "$limit": 11_i64 },
            post[0].clone(),
        ]
    );
}

#[test]
fn test_compile_pipeline_unbounded_has_no_limit() {
    let pipeline = compile_pipeline(
        &[],
        &two_field_plan(),
        Traversal::Backward,
        doc! {},
        Window::Unbounded,
        &[],
    );
    assert_eq!(
        pipeline,
        vec![
            doc! { "$match": {} },
            doc! { "$sort": { "createdAt": 1, "_id": -1 } },
        ]
    );
}

#[test]
fn test_compile_count_pipeline() {
    let pre = vec![doc! { "$match": { "status": "open" } }];
    let pipeline = compile_count_pipeline(&pre);
    assert_eq!(
        pipeline,
        vec![
            doc! { "$match": { "status": "open" } },
            doc! { "$group": { "_id": null, "count": { "$sum": 1 } } },
        ]
    );
}

#[test]
fn test_limit_value_saturates() {
    assert_eq!(limit_value(11), 11);
    assert_eq!(limit_value(u64::MAX), i64::MAX);
}

//! Tests for paginate module

use super::pager::count_from_rows;
use super::*;
use crate::config::PaginateConfig;
use crate::cursor::{Base64JsonCodec, Cursor, CursorCodec};
use crate::error::{Error, Result};
use crate::sort::{SortField, SortPlan};
use crate::store::MemoryStore;
use crate::types::{CursorDirection, Traversal};
use crate::value::SortValue;
use bson::{doc, Bson, Document};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value};
use test_case::test_case;

fn numbered(count: i64) -> Vec<Document> {
    (1..=count).map(|i| doc! { "_id": i, "n": i * 10 }).collect()
}

fn ids(docs: &[Document]) -> Vec<i64> {
    docs.iter().map(|d| d.get_i64("_id").unwrap()).collect()
}

fn sv(value: i64) -> SortValue {
    SortValue::from_bson(&Bson::Int64(value)).unwrap()
}

fn plan() -> SortPlan {
    SortPlan::build(vec![SortField::asc("n")], "_id").unwrap()
}

// ============================================================================
// Window Tests
// ============================================================================

#[test_case(Some(5), false, Window::Bounded(5); "positive limit")]
#[test_case(Some(0), false, Window::Unbounded; "zero is unbounded")]
#[test_case(Some(0), true, Window::Bounded(10); "zero forbidden uses default")]
#[test_case(Some(-3), false, Window::Bounded(10); "negative uses default")]
#[test_case(None, false, Window::Bounded(10); "absent uses default")]
fn test_resolve_window(limit: Option<i64>, forbid: bool, expected: Window) {
    let config = PaginateConfig::default().with_forbid_unbounded_fetch(forbid);
    assert_eq!(resolve_window(limit, &config), expected);
}

#[test]
fn test_window_limits() {
    assert_eq!(Window::Bounded(10).fetch_limit(), Some(11));
    assert_eq!(Window::Bounded(10).store_limit(), 11);
    assert_eq!(Window::Bounded(10).page_size(), Some(10));
    assert_eq!(Window::Unbounded.fetch_limit(), None);
    assert_eq!(Window::Unbounded.store_limit(), 0);
}

#[test]
fn test_window_fetch_limit_saturates() {
    assert_eq!(Window::Bounded(u64::MAX).fetch_limit(), Some(u64::MAX));
    assert_eq!(Window::Bounded(u64::MAX).page_size(), Some(u64::MAX));
}

// ============================================================================
// Options Tests
// ============================================================================

#[test]
fn test_options_deserialize_lenient() {
    let options: PaginateOptions = serde_json::from_value(json!({
        "sort": {"createdAt": -1},
        "limit": "abc",
        "next": "v1.token"
    }))
    .unwrap();

    assert_eq!(options.sort, vec![SortField::desc("createdAt")]);
    assert_eq!(options.limit, None);
    assert_eq!(options.after.as_deref(), Some("v1.token"));
    assert_eq!(options.traversal(), Traversal::Forward);
}

#[test_case(json!(5), Some(5); "integer")]
#[test_case(json!(5.0), Some(5); "integral float")]
#[test_case(json!(2.5), None; "fractional float")]
#[test_case(json!("7"), Some(7); "numeric string")]
#[test_case(json!(null), None; "null")]
#[test_case(json!(true), None; "bool")]
fn test_options_limit_forms(limit: Value, expected: Option<i64>) {
    let options: PaginateOptions = serde_json::from_value(json!({ "limit": limit })).unwrap();
    assert_eq!(options.limit, expected);
}

#[test]
fn test_options_rejects_both_cursors() {
    let options = PaginateOptions::default().after("a").before("b");
    let err = options.validate().unwrap_err();
    assert!(matches!(err, Error::InvalidOptions { .. }));
}

#[test]
fn test_options_before_walks_backward() {
    let options = PaginateOptions::default().before("b");
    assert_eq!(options.traversal(), Traversal::Backward);
    assert_eq!(options.anchor_token(), Some("b"));
}

#[test]
fn test_page_info_serializes_camel_case() {
    let info = PageInfo {
        has_next_page: true,
        has_previous_page: false,
        start_cursor: Some("s".into()),
        end_cursor: None,
    };
    assert_eq!(
        serde_json::to_value(&info).unwrap(),
        json!({"hasNextPage": true, "hasPreviousPage": false, "startCursor": "s"})
    );
}

// ============================================================================
// Assembly Tests
// ============================================================================

fn page_request(traversal: Traversal, anchored: bool, window: Window) -> PageRequest {
    PageRequest {
        plan: plan(),
        traversal,
        anchor: anchored.then(|| Cursor::new(CursorDirection::After, vec![sv(0), sv(0)])),
        window,
    }
}

#[test]
fn test_assemble_forward_drops_extra_row() {
    let request = page_request(Traversal::Forward, false, Window::Bounded(2));
    let page = assemble(numbered(3), &request, &Base64JsonCodec, Some(3)).unwrap();

    assert_eq!(ids(&page.items), vec![1, 2]);
    assert!(page.page_info.has_next_page);
    assert!(!page.page_info.has_previous_page);
    assert_eq!(page.total_count, Some(3));

    let start = Base64JsonCodec
        .decode(&request.plan, page.page_info.start_cursor.as_deref().unwrap())
        .unwrap();
    assert_eq!(start.direction, CursorDirection::Before);
    assert_eq!(start.values, vec![sv(10), sv(1)]);

    let end = Base64JsonCodec
        .decode(&request.plan, page.page_info.end_cursor.as_deref().unwrap())
        .unwrap();
    assert_eq!(end.direction, CursorDirection::After);
    assert_eq!(end.values, vec![sv(20), sv(2)]);
}

#[test]
fn test_assemble_backward_restores_order() {
    let request = page_request(Traversal::Backward, true, Window::Bounded(2));
    let mut fetched = numbered(3);
    fetched.reverse();

    let page = assemble(fetched, &request, &Base64JsonCodec, None).unwrap();
    assert_eq!(ids(&page.items), vec![2, 3]);
    assert!(page.page_info.has_previous_page);
    assert!(page.page_info.has_next_page);
    assert_eq!(page.total_count, None);
}

#[test]
fn test_assemble_empty_page() {
    let request = page_request(Traversal::Forward, true, Window::Bounded(5));
    let page = assemble(Vec::new(), &request, &Base64JsonCodec, Some(0)).unwrap();

    assert!(page.is_empty());
    assert!(!page.page_info.has_next_page);
    assert!(page.page_info.has_previous_page);
    assert_eq!(page.page_info.start_cursor, None);
    assert_eq!(page.page_info.end_cursor, None);
}

#[test]
fn test_assemble_unbounded_never_has_more() {
    let request = page_request(Traversal::Forward, false, Window::Unbounded);
    let page = assemble(numbered(50), &request, &Base64JsonCodec, None).unwrap();
    assert_eq!(page.len(), 50);
    assert!(!page.page_info.has_next_page);
}

#[test]
fn test_assemble_missing_sort_field_fails() {
    let request = page_request(Traversal::Forward, false, Window::Bounded(2));
    let err = assemble(vec![doc! { "_id": 1 }], &request, &Base64JsonCodec, None).unwrap_err();
    assert!(matches!(err, Error::MissingField { ref path } if path == "n"));
}

#[test]
fn test_count_from_rows() {
    assert_eq!(count_from_rows(&[]), 0);
    assert_eq!(count_from_rows(&[doc! { "_id": null, "count": 7 }]), 7);
    assert_eq!(count_from_rows(&[doc! { "_id": null, "count": 7_i64 }]), 7);
}

#[derive(Debug, PartialEq, Deserialize)]
struct Numbered {
    #[serde(rename = "_id")]
    id: i64,
    n: i64,
}

#[test]
fn test_result_items_as_and_extjson() {
    let request = page_request(Traversal::Forward, false, Window::Bounded(2));
    let page = assemble(numbered(3), &request, &Base64JsonCodec, Some(3)).unwrap();

    let typed: Vec<Numbered> = page.items_as().unwrap();
    assert_eq!(typed, vec![Numbered { id: 1, n: 10 }, Numbered { id: 2, n: 20 }]);
    assert!(matches!(
        page.items_as::<Vec<String>>(),
        Err(Error::BsonDecode(_))
    ));

    let rendered = page.to_extjson().unwrap();
    assert_eq!(rendered["items"], json!([{"_id": 1, "n": 10}, {"_id": 2, "n": 20}]));
    assert_eq!(rendered["pageInfo"]["hasNextPage"], json!(true));
    assert_eq!(rendered["totalCount"], json!(3));
}

// ============================================================================
// Pager Tests
// ============================================================================

/// Wraps the default codec with a visible prefix
struct PrefixedCodec;

impl CursorCodec for PrefixedCodec {
    fn encode(&self, plan: &SortPlan, cursor: &Cursor) -> Result<String> {
        Ok(format!("x-{}", Base64JsonCodec.encode(plan, cursor)?))
    }

    fn decode(&self, plan: &SortPlan, token: &str) -> Result<Cursor> {
        let inner = token
            .strip_prefix("x-")
            .ok_or_else(|| Error::invalid_cursor("missing prefix"))?;
        Base64JsonCodec.decode(plan, inner)
    }
}

#[tokio::test]
async fn test_pager_uses_custom_codec() {
    let pager = Pager::new(MemoryStore::new("items", numbered(5))).with_codec(PrefixedCodec);
    let options = PaginateOptions::new(vec![SortField::asc("n")]).with_limit(2);

    let first = pager.find(&options, &FindQuery::new()).await.unwrap();
    let end = first.page_info.end_cursor.clone().unwrap();
    assert!(end.starts_with("x-v1."));

    let second = pager
        .find(&options.clone().after(end), &FindQuery::new())
        .await
        .unwrap();
    assert_eq!(ids(&second.items), vec![3, 4]);

    let err = pager
        .find(&options.clone().after("v1.abc"), &FindQuery::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCursor { .. }));
}

#[test]
fn test_find_paged_blocking() {
    let store = MemoryStore::new("items", numbered(4));
    let config = PaginateConfig::default().with_suppress_total_count(true);
    let options = PaginateOptions::new(vec![SortField::desc("n")]).with_limit(3);

    let page = tokio_test::block_on(find_paged(&store, &config, &options, &FindQuery::new()))
        .unwrap();
    assert_eq!(ids(&page.items), vec![4, 3, 2]);
    assert_eq!(page.total_count, None);
    assert!(page.page_info.has_next_page);
}

#[tokio::test]
async fn test_rejects_invalid_options_before_store_call() {
    let store = MemoryStore::new("items", numbered(4));
    let options = PaginateOptions::default().after("a").before("b");

    let err = find_paged(&store, &PaginateConfig::default(), &options, &FindQuery::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOptions { .. }));
    assert!(store.calls().await.is_empty());
}

#[tokio::test]
async fn test_rejects_zero_default_limit_before_store_call() {
    let store = MemoryStore::new("items", numbered(4));
    let config = PaginateConfig::default().with_default_limit(0);
    let options = PaginateOptions::new(vec![SortField::asc("n")]);

    let err = find_paged(&store, &config, &options, &FindQuery::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "default_limit"));
    assert!(store.calls().await.is_empty());
}

#[tokio::test]
async fn test_huge_limit_fetches_everything() {
    let store = MemoryStore::new("items", numbered(4));
    let options = PaginateOptions::new(vec![SortField::asc("n")]).with_limit(i64::MAX);

    let page = find_paged(&store, &PaginateConfig::default(), &options, &FindQuery::new())
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![1, 2, 3, 4]);
    assert!(!page.page_info.has_next_page);
}

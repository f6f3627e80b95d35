//! Ordering and Pagination Tests
//!
//! Tests for windowing invariants:
//! - Indexed and cursor execution produce the same window
//! - Skip, Take, TakeLast, First and Last compose in application order
//! - Metadata cursor mode is used only for cursor-only ordered queries

mod common;

use std::sync::Arc;

use aeroquery::executor::CursorMode;
use aeroquery::{CancelToken, EngineConfig, Expr, IndexCatalog, MemoryStore, Query, QueryEngine};
use common::{compound_indexes, engine, ids, pk_only, single_indexes};
use serde_json::json;

// Ages by id: 1:25 2:32 3:39 4:46 5:53 6:20 7:27 8:34 9:41 10:48 11:55 12:22
// 13:29 14:36; id 15 has no age, id 16 a null age.

async fn window(catalog: IndexCatalog, query: &Query) -> (Vec<i64>, Option<CursorMode>) {
    let engine = engine(catalog);
    let result = engine
        .run_with_cancel(query, &CancelToken::new())
        .await
        .unwrap();
    let cursor_mode = result.cursor_mode;
    (ids(&result.into_records()), cursor_mode)
}

// =============================================================================
// Indexed vs Cursor Equivalence
// =============================================================================

/// Ordered window over an index matches the forced-cursor window.
#[tokio::test]
async fn test_indexed_and_cursor_windows_agree() {
    let query = Query::new()
        .filter(Expr::gt("age", json!(25)))
        .order_by("age")
        .skip(2)
        .take(3);

    let (indexed, indexed_mode) = window(single_indexes(), &query).await;
    let (cursor, cursor_mode) = window(pk_only(), &query).await;

    assert_eq!(indexed, vec![2, 8, 14]);
    assert_eq!(cursor, indexed);
    assert_eq!(indexed_mode, None);
    assert_eq!(cursor_mode, Some(CursorMode::Metadata));
}

/// Descending order with Take.
#[tokio::test]
async fn test_descending_take() {
    let query = Query::new()
        .filter(Expr::gt("age", json!(25)))
        .order_by_descending("age")
        .take(2);
    for catalog in [pk_only(), single_indexes(), compound_indexes()] {
        assert_eq!(window(catalog, &query).await.0, vec![11, 5]);
    }
}

// =============================================================================
// TakeLast, First, Last
// =============================================================================

/// TakeLast keeps the tail of the ordered sequence.
#[tokio::test]
async fn test_take_last_after_ordering() {
    let query = Query::new()
        .filter(Expr::gt("age", json!(25)))
        .order_by("age")
        .take_last(2);
    for catalog in [pk_only(), single_indexes()] {
        assert_eq!(window(catalog, &query).await.0, vec![5, 11]);
    }
}

/// TakeLast without ordering takes the primary-key tail through the cursor.
#[tokio::test]
async fn test_take_last_without_ordering() {
    let query = Query::new().filter(Expr::gt("age", json!(25))).take_last(3);
    let (got, mode) = window(single_indexes(), &query).await;
    assert_eq!(got, vec![11, 13, 14]);
    assert_eq!(mode, Some(CursorMode::Metadata));
}

/// First and Last pick single records.
#[tokio::test]
async fn test_first_and_last() {
    let base = Query::new().filter(Expr::lt("age", json!(30))).order_by("age");
    assert_eq!(window(single_indexes(), &base.first()).await.0, vec![6]);
    assert_eq!(window(single_indexes(), &base.last()).await.0, vec![13]);
    assert_eq!(window(pk_only(), &base.last()).await.0, vec![13]);
}

/// Skip past the end yields nothing.
#[tokio::test]
async fn test_skip_past_end() {
    let query = Query::new().filter(Expr::lt("age", json!(30))).skip(50);
    assert!(window(single_indexes(), &query).await.0.is_empty());
}

// =============================================================================
// Unindexed Ordering
// =============================================================================

/// Ordering on an unindexed field forces the cursor path.
#[tokio::test]
async fn test_unindexed_ordering_forces_cursor() {
    let query = Query::new()
        .filter(Expr::eq("city", json!("oslo")))
        .order_by("name")
        .skip(1)
        .take(2);
    let (got, mode) = window(compound_indexes(), &query).await;
    // oslo: cleo(3) fay(6) ivy(9) lea(12) oda(15)
    assert_eq!(got, vec![6, 9]);
    assert_eq!(mode, Some(CursorMode::Metadata));
}

/// With cursor fallback disabled the same query is rejected up front.
#[tokio::test]
async fn test_unindexed_ordering_rejected_without_fallback() {
    let store = common::store(compound_indexes());
    let catalog = Arc::clone(store.catalog());
    let config = EngineConfig::from_json_str(r#"{"cursor_fallback": false}"#).unwrap();
    let engine = QueryEngine::with_config(store, catalog, config).unwrap();

    let err = engine
        .run(&Query::new().order_by("name"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AERO_QUERY_INDEX_NOT_FOUND");
    assert_eq!(engine.store().call_count(), 0);
}

// =============================================================================
// Combined Scenario
// =============================================================================

/// age > 30 && testInt == 9, ordered by age, skip 1, take 3.
#[tokio::test]
async fn test_indexed_conjunction_scenario() {
    let catalog = IndexCatalog::new("person", ["id"])
        .with_index("age")
        .with_index("testInt");
    let people = (1..=10).map(|i| {
        json!({
            "id": i,
            "age": 25 + i * 2,
            "testInt": if i % 2 == 0 { 9 } else { 1 },
        })
    });
    let store = MemoryStore::with_records(Arc::new(catalog), people).unwrap();
    let catalog = Arc::clone(store.catalog());
    let engine = QueryEngine::new(store, catalog);

    let query = Query::new()
        .filter(Expr::gt("age", json!(30)) & Expr::eq("testInt", json!(9)))
        .order_by("age")
        .skip(1)
        .take(3);
    let result = engine
        .run_with_cancel(&query, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(result.lookups_issued, 1);
    assert_eq!(result.cursor_mode, None);
    assert_eq!(ids(&result.into_records()), vec![6, 8, 10]);
}

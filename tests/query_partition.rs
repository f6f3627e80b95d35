//! Partition Completeness Tests
//!
//! Whatever mix of indexed lookups and cursor groups a catalog leads to, a
//! query must return exactly the records an in-memory filter accepts, each
//! once.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use aeroquery::{compile, Expr, IndexCatalog, MemoryStore, Query, QueryEngine};
use common::{catalogs, engine, ids, naive_ids, naive_ids_in, numeric_edges};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn filters() -> Vec<Expr> {
    vec![
        Expr::gt("age", json!(30)),
        Expr::gte("age", json!(25)) & Expr::lt("age", json!(40)),
        Expr::eq("age", json!(32)) | Expr::eq("city", json!("bergen")),
        Expr::starts_with("name", "d") | Expr::lt("age", json!(23)),
        Expr::eq("city", json!("oslo")) & Expr::eq("zip", json!("03")),
        Expr::one_of("age", vec![json!(20), json!(41), json!(99)]),
        !Expr::gt("age", json!(30)),
        Expr::ne("age", json!(32)),
        Expr::is_null("age"),
        Expr::gt("age", json!(30)) & Expr::ends_with("name", "a"),
        Expr::eq("email", json!("p7@example.com")) | Expr::eq("id", json!(12)),
        Expr::Constant(true),
    ]
}

async fn run_ids(catalog_index: usize, expr: &Expr) -> Vec<i64> {
    let engine = engine(catalogs().remove(catalog_index));
    let records = engine.run(&Query::new().filter(expr.clone())).await.unwrap();
    ids(&records)
}

// =============================================================================
// Completeness
// =============================================================================

/// Every catalog returns exactly the naive result set.
#[tokio::test]
async fn test_results_match_naive_filter() {
    for expr in filters() {
        let expected = naive_ids(&expr);
        for catalog in 0..catalogs().len() {
            let got: BTreeSet<i64> = run_ids(catalog, &expr).await.into_iter().collect();
            assert_eq!(got, expected, "catalog {} filter {:?}", catalog, expr);
        }
    }
}

/// No record appears twice, even when several groups select it.
#[tokio::test]
async fn test_no_duplicates() {
    let overlapping = Expr::gt("age", json!(20))
        | Expr::eq("city", json!("oslo"))
        | Expr::starts_with("name", "e");
    for catalog in 0..catalogs().len() {
        let got = run_ids(catalog, &overlapping).await;
        let unique: BTreeSet<i64> = got.iter().copied().collect();
        assert_eq!(got.len(), unique.len(), "catalog {}", catalog);
    }
}

/// Without ordering, results come back in primary-key order.
#[tokio::test]
async fn test_unordered_results_follow_primary_key() {
    let expr = Expr::lt("age", json!(30)) | Expr::eq("city", json!("tromso"));
    for catalog in 0..catalogs().len() {
        let got = run_ids(catalog, &expr).await;
        let mut sorted = got.clone();
        sorted.sort_unstable();
        assert_eq!(got, sorted, "catalog {}", catalog);
    }
}

/// Null and missing values never satisfy negated predicates.
#[tokio::test]
async fn test_null_values_fail_negations() {
    let expr = Expr::ne("age", json!(32));
    let expected = naive_ids(&expr);
    assert!(!expected.contains(&15));
    assert!(!expected.contains(&16));
    assert_eq!(expected.len(), 13);

    let got: BTreeSet<i64> = run_ids(1, &expr).await.into_iter().collect();
    assert_eq!(got, expected);
}

// =============================================================================
// Compiler Idempotence
// =============================================================================

/// Compiling the expression form of a compiled filter changes nothing.
#[test]
fn test_recompiling_is_identity() {
    for expr in filters() {
        let once = compile(&expr).unwrap();
        let twice = compile(&once.to_expr()).unwrap();
        assert_eq!(once, twice, "filter {:?}", expr);
    }
}

// =============================================================================
// Numeric Edge Cases
// =============================================================================

const LOW: u64 = 9_007_199_254_740_992; // 2^53
const HIGH: u64 = LOW + 1;

fn numeric_store(indexed: bool) -> MemoryStore {
    let catalog = if indexed {
        IndexCatalog::new("point", ["id"]).with_index("n")
    } else {
        IndexCatalog::new("point", ["id"])
    };
    MemoryStore::with_records(Arc::new(catalog), numeric_edges()).unwrap()
}

/// Integers past 2^53, int/float twins and signed zeros give the same rows
/// whether or not `n` is indexed.
#[tokio::test]
async fn test_numeric_edges_match_naive_filter() {
    let filters = vec![
        Expr::gt("n", json!(LOW)),
        Expr::gte("n", json!(HIGH)),
        Expr::eq("n", json!(HIGH)),
        Expr::eq("n", json!(1)),
        Expr::eq("n", json!(1.0)),
        Expr::eq("n", json!(-0.0)),
        Expr::lt("n", json!(0.5)),
        Expr::ne("n", json!(1)),
        Expr::one_of("n", vec![json!(0), json!(HIGH)]),
        Expr::lt("n", json!(-9_007_199_254_740_992i64)),
        Expr::gt("n", json!(2.4)) & Expr::lt("n", json!(3)),
        Expr::gt("n", json!(LOW)) & Expr::lt("n", json!(u64::MAX)),
    ];
    for expr in filters {
        let expected = naive_ids_in(numeric_edges(), &expr);
        for indexed in [false, true] {
            let store = numeric_store(indexed);
            let catalog = Arc::clone(store.catalog());
            let engine = QueryEngine::new(store, catalog);
            let records = engine.run(&Query::new().filter(expr.clone())).await.unwrap();
            let got: BTreeSet<i64> = ids(&records).into_iter().collect();
            assert_eq!(got, expected, "indexed {} filter {:?}", indexed, expr);
        }
    }

    let above = naive_ids_in(numeric_edges(), &Expr::gt("n", json!(LOW)));
    assert_eq!(above, BTreeSet::from([HIGH as i64, 6]));
}

/// Numerically distinct primary keys are distinct entities; `1` and `1.0`
/// or `0` and `-0.0` are the same one.
#[tokio::test]
async fn test_numeric_primary_key_identity() {
    let store = numeric_store(false);
    assert_eq!(store.len(), numeric_edges().len());

    let catalog = Arc::clone(store.catalog());
    let engine = QueryEngine::new(store, catalog);
    let low = engine
        .run(&Query::new().filter(Expr::eq("id", json!(LOW))))
        .await
        .unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].get("tag"), Some(&json!("low")));

    let twins = vec![
        json!({"id": 1, "v": "int"}),
        json!({"id": 1.0, "v": "float"}),
        json!({"id": 0, "v": "zero"}),
        json!({"id": -0.0, "v": "negative zero"}),
    ];
    let store = MemoryStore::with_records(Arc::new(IndexCatalog::new("point", ["id"])), twins).unwrap();
    assert_eq!(store.len(), 2);
}

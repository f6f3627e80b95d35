//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use aeroquery::executor::ConditionFilter;
use aeroquery::{compile, Expr, IndexCatalog, MemoryStore, QueryEngine, Record};
use serde_json::{json, Value};

const NAMES: [&str; 16] = [
    "ada", "bea", "cleo", "dora", "eve", "fay", "gus", "hal", "ivy", "jon", "kim", "lea", "max",
    "ned", "oda", "pia",
];

const CITIES: [&str; 3] = ["oslo", "bergen", "tromso"];

/// Sixteen people. Ages are distinct; id 15 has no age and id 16 a null age.
pub fn people() -> Vec<Value> {
    (1..=16i64)
        .map(|id| {
            let mut body = json!({
                "id": id,
                "name": NAMES[(id - 1) as usize],
                "city": CITIES[(id % 3) as usize],
                "zip": format!("0{}", id % 4),
                "email": format!("p{}@example.com", id),
                "tags": if id % 2 == 0 { json!(["a", "b"]) } else { json!(["c"]) },
            });
            match id {
                15 => {}
                16 => body["age"] = Value::Null,
                _ => body["age"] = json!(18 + (id * 7) % 40),
            }
            body
        })
        .collect()
}

/// Numeric edge cases: integers beyond 2^53, int/float twins, signed zeros
pub fn numeric_edges() -> Vec<Value> {
    vec![
        json!({"id": 9007199254740992u64, "n": 9007199254740992u64, "tag": "low"}),
        json!({"id": 9007199254740993u64, "n": 9007199254740993u64, "tag": "high"}),
        json!({"id": 1, "n": 1.0}),
        json!({"id": 2, "n": 1}),
        json!({"id": 3, "n": -0.0}),
        json!({"id": 4, "n": 0}),
        json!({"id": 5, "n": 2.5}),
        json!({"id": 6, "n": u64::MAX}),
        json!({"id": 7, "n": -9007199254740993i64}),
        json!({"id": 8, "n": "1"}),
    ]
}

pub fn pk_only() -> IndexCatalog {
    IndexCatalog::new("person", ["id"])
}

pub fn single_indexes() -> IndexCatalog {
    pk_only()
        .with_index("age")
        .with_index("name")
        .with_index("city")
}

pub fn compound_indexes() -> IndexCatalog {
    pk_only()
        .with_index("age")
        .with_compound(["city", "zip"])
        .with_unique("email")
}

pub fn catalogs() -> Vec<IndexCatalog> {
    vec![pk_only(), single_indexes(), compound_indexes()]
}

pub fn store(catalog: IndexCatalog) -> MemoryStore {
    MemoryStore::with_records(Arc::new(catalog), people()).unwrap()
}

pub fn engine(catalog: IndexCatalog) -> QueryEngine<MemoryStore> {
    let store = store(catalog);
    let catalog = Arc::clone(store.catalog());
    QueryEngine::new(store, catalog)
}

/// Ids of every fixture record the compiled expression accepts, in id order
pub fn naive_ids(expr: &Expr) -> BTreeSet<i64> {
    naive_ids_in(people(), expr)
}

/// Ids of every record in `bodies` the compiled expression accepts
pub fn naive_ids_in(bodies: Vec<Value>, expr: &Expr) -> BTreeSet<i64> {
    let filter = compile(expr).unwrap();
    bodies
        .into_iter()
        .map(Record::new)
        .filter(|record| ConditionFilter::matches_any(record, filter.groups()))
        .map(|record| id_of(&record))
        .collect()
}

pub fn id_of(record: &Record) -> i64 {
    record.get("id").and_then(Value::as_i64).unwrap()
}

pub fn ids(records: &[Record]) -> Vec<i64> {
    records.iter().map(id_of).collect()
}

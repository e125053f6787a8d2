//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

pub use quire::{
    Container, ContainerConfig, Document, ItemOptions, JsonPath, PartitionKey, PatchOperation,
    QueryDefinition, QueryOptions, QuireError, VersionToken,
};
pub use serde_json::{json, Value};
use std::sync::Arc;

/// Partition-key path used by the sample container.
pub const PK_PATH: &str = "/myPartitionKey";

/// Container shaped like the sample script's `ExampleContainer`.
pub fn example_container() -> Container {
    Container::new(ContainerConfig::new("ExampleContainer", PK_PATH))
        .expect("example config is valid")
}

/// Shared container for multi-threaded tests.
pub fn shared_container() -> Arc<Container> {
    Arc::new(example_container())
}

/// Partition-key value helper.
pub fn pk(value: &str) -> PartitionKey {
    PartitionKey::from(value)
}

/// Minimal document in `partition`.
pub fn doc(id: &str, partition: &str) -> Value {
    json!({"id": id, "myPartitionKey": partition})
}

/// Document with a numeric counter field.
pub fn counter(id: &str, partition: &str, value: i64) -> Value {
    json!({"id": id, "myPartitionKey": partition, "counter": value})
}

/// Nested document with object, array and scalar fields.
pub fn sample_document(id: &str) -> Value {
    json!({
        "id": id,
        "myPartitionKey": "2024-01-01",
        "name": "John Smith",
        "bool": true,
        "number": 1,
        "childObject": {"someProperty": "someValue"},
        "childArray": ["apple", "orange"]
    })
}

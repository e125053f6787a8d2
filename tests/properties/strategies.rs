//! Shared proptest strategies

use crate::common::*;
use proptest::prelude::*;

/// Scalar JSON values
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        "[a-z ]{0,12}".prop_map(Value::from),
    ]
}

/// Nested JSON values, a few levels deep
pub fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Field names that never collide with id, partition key or system properties
pub fn field() -> impl Strategy<Value = String> {
    "f_[a-z]{1,5}"
}

/// Partition-key values
pub fn partition() -> impl Strategy<Value = String> {
    "p[0-9]{1,2}"
}

/// A document body with id `id` in `partition`
pub fn document(id: &'static str) -> impl Strategy<Value = Value> {
    (partition(), prop::collection::btree_map(field(), value(), 0..6)).prop_map(
        move |(partition, fields)| {
            let mut body = serde_json::Map::new();
            body.insert("id".to_string(), json!(id));
            body.insert("myPartitionKey".to_string(), json!(partition));
            body.extend(fields);
            Value::Object(body)
        },
    )
}

/// Single patch operations on top-level generated fields
pub fn operation() -> impl Strategy<Value = PatchOperation> {
    prop_oneof![
        (field(), value()).prop_map(|(f, v)| PatchOperation::add(format!("/{}", f), v)),
        (field(), value()).prop_map(|(f, v)| PatchOperation::set(format!("/{}", f), v)),
        field().prop_map(|f| PatchOperation::remove(format!("/{}", f))),
        (field(), -1000i64..1000).prop_map(|(f, n)| PatchOperation::increment(format!("/{}", f), n)),
        (field(), scalar()).prop_map(|(f, v)| PatchOperation::append(format!("/{}", f), v)),
    ]
}

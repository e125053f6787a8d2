//! Quire - embedded, partition-keyed document store
//!
//! Documents are JSON objects addressed by (partition-key value, id). Every
//! write issues a fresh version token; writes that carry a stale token fail
//! without changing anything.
//!
//! # Quick Start
//!
//! ```
//! use quire::{Container, ContainerConfig, ItemOptions, PatchOperation};
//! use serde_json::json;
//!
//! let container = Container::new(ContainerConfig::new("people", "/city"))?;
//!
//! let created = container.create_item(json!({"id": "A", "city": "Leeds", "visits": 1}))?;
//! let patched = container.patch_item(
//!     "A",
//!     created.partition_key(),
//!     &[PatchOperation::increment("/visits", 1)],
//!     &ItemOptions::if_match(created.etag().clone()),
//! )?;
//! assert_eq!(patched.get("visits"), Some(&json!(2)));
//! # Ok::<(), quire::QuireError>(())
//! ```
//!
//! # Architecture
//!
//! - `quire-core`: values, paths, partition keys, tokens, patch engine, errors
//! - `quire-storage`: partition-sharded slots with per-document locks
//! - `quire-engine`: the [`Container`], its config, queries and feeds
//!
//! Storage internals are not re-exported.

pub use quire_core::{
    Document, DocumentLimits, JsonPath, JsonValue, KeySchema, Numeric, PartitionKey,
    PatchOperation, QuireError, QuireResult, Timestamp, VersionToken,
};
pub use quire_engine::{
    CompiledQuery, Container, ContainerConfig, FeedIterator, ItemOptions, QueryDefinition,
    QueryOptions,
};

//! Core types for Quire
//!
//! This crate defines the foundational types used throughout the system:
//! - JsonValue / JsonPath: document values and slash-delimited paths
//! - PartitionKey: scalar partition-key values
//! - VersionToken / VersionGuard: optimistic-concurrency tokens
//! - Document / KeySchema: stored documents and id/partition-key extraction
//! - PatchOperation / PatchEngine: atomic partial updates
//! - QuireError: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod json;
pub mod partition;
pub mod patch;
pub mod timestamp;
pub mod version;

pub use document::{
    strip_system_properties, validate_id, Document, KeySchema, ETAG_PROPERTY, SYSTEM_PROPERTIES,
    TS_PROPERTY,
};
pub use error::{QuireError, QuireResult};
pub use json::{
    get_at_path, get_at_path_mut, json_equals, DocumentLimits, JsonPath, JsonValue, LimitError,
    PathParseError,
};
pub use partition::PartitionKey;
pub use patch::{Numeric, PatchEngine, PatchOperation};
pub use timestamp::Timestamp;
pub use version::{VersionGuard, VersionToken};

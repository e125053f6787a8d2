//! Document engine for Quire
//!
//! This crate ties the lower layers together:
//! - Container: create/read/upsert/replace/patch/delete and queries
//! - ContainerConfig: container settings, loadable from `quire.toml`
//! - QueryDefinition / QueryOptions: parameterized equality filters
//! - FeedIterator: lazy, paged query results

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod container;
pub mod feed;
pub mod query;

pub use config::{ContainerConfig, CONFIG_FILE_NAME, DEFAULT_ID_FIELD, DEFAULT_PAGE_SIZE};
pub use container::{Container, ItemOptions};
pub use feed::FeedIterator;
pub use query::{CompiledQuery, QueryDefinition, QueryOptions};

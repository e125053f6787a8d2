//! End-to-end document store scenarios
//!
//! Each module drives a `Container` through a full lifecycle using only the
//! public facade.

#[path = "../common/mod.rs"]
mod common;

mod lifecycle;
mod query_routing;
mod walkthrough;

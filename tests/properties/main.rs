//! Property tests for the document store
//!
//! Generated documents and patch batches check the store's algebraic
//! guarantees: round-trips, stale-token safety, patch atomicity.

#[path = "../common/mod.rs"]
mod common;

mod strategies;

mod patch_laws;

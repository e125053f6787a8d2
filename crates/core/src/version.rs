//! Version tokens for optimistic concurrency
//!
//! Every successful write stamps the document with a fresh [`VersionToken`].
//! A writer that supplies an expected token succeeds only if it still equals
//! the stored one.
//!
//! ## Token Construction
//!
//! A token is a container-wide write sequence number followed by an xxh3
//! hash of the serialized content, rendered as a quoted hex string:
//!
//! ```text
//! "0000000000000007a3f19c04e2b8d615"
//!  ^ sequence (16)  ^ content hash (16)
//! ```
//!
//! The sequence never repeats within a [`VersionGuard`], so a document
//! re-created at a deleted slot can never collide with a token handed out
//! before the delete. Callers treat tokens as opaque and compare them for
//! equality only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use xxhash_rust::xxh3::xxh3_64;

/// Opaque document revision token (ETag-like)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wrap a token string received from a caller
    pub fn new(token: impl Into<String>) -> Self {
        VersionToken(token.into())
    }

    /// The token as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionToken {
    fn from(v: &str) -> Self {
        VersionToken(v.to_string())
    }
}

impl From<String> for VersionToken {
    fn from(v: String) -> Self {
        VersionToken(v)
    }
}

/// Issues and checks version tokens
///
/// One guard per container. Thread-safe; issuing is a single atomic
/// increment plus a hash.
#[derive(Debug, Default)]
pub struct VersionGuard {
    sequence: AtomicU64,
}

impl VersionGuard {
    /// Create a guard whose first token uses sequence 1
    pub fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
        }
    }

    /// Issue a token for freshly written content
    pub fn issue(&self, content: &serde_json::Value) -> VersionToken {
        let seq = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        let hash = xxh3_64(content.to_string().as_bytes());
        VersionToken(format!("\"{:016x}{:016x}\"", seq, hash))
    }

    /// Compare a caller's expected token with the stored one
    #[inline]
    pub fn check(expected: &VersionToken, actual: &VersionToken) -> bool {
        expected == actual
    }
}

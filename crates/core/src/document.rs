//! Stored documents and the key schema that addresses them
//!
//! A [`Document`] is what every read and write returns: the stored body plus
//! the system-assigned id, partition key, version token and timestamp.
//! [`KeySchema`] knows where the id and partition key live inside a body.

use crate::error::{QuireError, QuireResult};
use crate::json::{get_at_path, JsonPath, JsonValue};
use crate::partition::PartitionKey;
use crate::timestamp::Timestamp;
use crate::version::VersionToken;
use serde::{Deserialize, Serialize};

/// System property carrying the version token
pub const ETAG_PROPERTY: &str = "_etag";

/// System property carrying the last-modified timestamp
pub const TS_PROPERTY: &str = "_ts";

/// Top-level properties owned by the store
///
/// Stripped from caller content before it is stored.
pub const SYSTEM_PROPERTIES: &[&str] = &[ETAG_PROPERTY, TS_PROPERTY, "_rid", "_self", "_attachments"];

/// Maximum id length in bytes
pub const MAX_ID_BYTES: usize = 255;

/// Characters an id may not contain
const FORBIDDEN_ID_CHARS: &[char] = &['/', '\\', '?', '#'];

/// Remove system properties from a top-level object
pub fn strip_system_properties(value: &mut serde_json::Value) {
    if let Some(obj) = value.as_object_mut() {
        for prop in SYSTEM_PROPERTIES {
            obj.remove(*prop);
        }
    }
}

/// Check an id against the identifier rules
pub fn validate_id(id: &str) -> QuireResult<()> {
    if id.is_empty() {
        return Err(QuireError::invalid_input("document id must not be empty"));
    }
    if id.len() > MAX_ID_BYTES {
        return Err(QuireError::invalid_input(format!(
            "document id is {} bytes, maximum is {}",
            id.len(),
            MAX_ID_BYTES
        )));
    }
    if let Some(c) = id.chars().find(|c| FORBIDDEN_ID_CHARS.contains(c)) {
        return Err(QuireError::invalid_input(format!(
            "document id '{}' contains forbidden character '{}'",
            id, c
        )));
    }
    Ok(())
}

/// A document as stored in a container
///
/// Two reads of an unchanged slot return equal `Document`s, token and
/// timestamp included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    partition_key: PartitionKey,
    body: JsonValue,
    etag: VersionToken,
    ts: Timestamp,
}

impl Document {
    /// Assemble a stored document
    ///
    /// `body` must already contain the id and partition key and be free of
    /// system properties.
    pub fn new(
        id: String,
        partition_key: PartitionKey,
        body: JsonValue,
        etag: VersionToken,
        ts: Timestamp,
    ) -> Self {
        Self {
            id,
            partition_key,
            body,
            etag,
            ts,
        }
    }

    /// Document id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Partition-key value
    pub fn partition_key(&self) -> &PartitionKey {
        &self.partition_key
    }

    /// Stored content (without system properties)
    pub fn body(&self) -> &JsonValue {
        &self.body
    }

    /// Current version token
    pub fn etag(&self) -> &VersionToken {
        &self.etag
    }

    /// Last-modified time
    pub fn timestamp(&self) -> Timestamp {
        self.ts
    }

    /// Top-level field of the body
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.body.get(field)
    }

    /// Value at a path inside the body
    pub fn get_path(&self, path: &JsonPath) -> Option<&serde_json::Value> {
        get_at_path(self.body.as_inner(), path)
    }

    /// Render with `_etag` and `_ts` included
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = self.body.as_inner().clone();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                ETAG_PROPERTY.to_string(),
                serde_json::Value::String(self.etag.as_str().to_string()),
            );
            obj.insert(TS_PROPERTY.to_string(), serde_json::Value::from(self.ts.as_secs()));
        }
        value
    }

    /// Consume into the stored body
    pub fn into_body(self) -> JsonValue {
        self.body
    }
}

/// Where a container finds the id and partition key in a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    id_field: String,
    partition_key_path: JsonPath,
}

impl KeySchema {
    /// Create a schema; paths are validated by the container config
    pub fn new(id_field: impl Into<String>, partition_key_path: JsonPath) -> Self {
        Self {
            id_field: id_field.into(),
            partition_key_path,
        }
    }

    /// Name of the top-level id field
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Path of the partition key
    pub fn partition_key_path(&self) -> &JsonPath {
        &self.partition_key_path
    }

    /// Path of the id field
    pub fn id_path(&self) -> JsonPath {
        JsonPath::root().key(self.id_field.clone())
    }

    /// Read the id, if the body carries one
    ///
    /// Fails if the field is present but not a valid id string.
    pub fn extract_id(&self, body: &serde_json::Value) -> QuireResult<Option<String>> {
        match body.get(&self.id_field) {
            None => Ok(None),
            Some(serde_json::Value::String(id)) => {
                validate_id(id)?;
                Ok(Some(id.clone()))
            }
            Some(other) => Err(QuireError::invalid_input(format!(
                "document field '{}' must be a string, found {}",
                self.id_field,
                crate::json::value_type_name(other)
            ))),
        }
    }

    /// Read the id, failing if absent
    pub fn require_id(&self, body: &serde_json::Value) -> QuireResult<String> {
        self.extract_id(body)?.ok_or_else(|| {
            QuireError::invalid_input(format!("document is missing '{}'", self.id_field))
        })
    }

    /// Read the partition key, failing if absent or not a scalar
    pub fn extract_partition_key(&self, body: &serde_json::Value) -> QuireResult<PartitionKey> {
        let value = get_at_path(body, &self.partition_key_path).ok_or_else(|| {
            QuireError::invalid_input(format!(
                "document is missing partition key '{}'",
                self.partition_key_path
            ))
        })?;
        PartitionKey::from_json(value).ok_or_else(|| {
            QuireError::invalid_input(format!(
                "partition key '{}' must be a string, number, boolean or null",
                self.partition_key_path
            ))
        })
    }

    /// True if writing at `path` would touch the id or partition key
    pub fn is_protected(&self, path: &JsonPath) -> bool {
        path.overlaps(&self.id_path()) || path.overlaps(&self.partition_key_path)
    }
}

//! Partial document updates
//!
//! A patch is an ordered batch of [`PatchOperation`]s applied to one
//! document. The [`PatchEngine`] applies a batch to a working copy and hands
//! back the result only if every operation succeeds; on failure the caller's
//! document is untouched and the error names the first failing operation.
//!
//! ## Operations
//!
//! | Op | Target must exist | Array parent |
//! |----|-------------------|--------------|
//! | `add` | no (intermediate objects created) | index inserts, `-` appends |
//! | `set` | no (intermediate objects created) | index replaces, `-` appends |
//! | `replace` | yes | index replaces |
//! | `remove` | yes | index removes |
//! | `incr` | no (created with the amount) | index increments |
//! | `append` | yes, and must be an array | n/a |
//!
//! No operation may target the root, the id field or the partition-key path.
//!
//! Wire form follows JSON Patch: `{"op": "add", "path": "/color", "value": "silver"}`.

use crate::document::KeySchema;
use crate::error::{QuireError, QuireResult};
use crate::json::{
    get_at_path_mut, parse_index, validate_limits, value_type_name, DocumentLimits, JsonPath, JsonValue,
    END_OF_ARRAY,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Increment amount
///
/// Integer + integer stays an integer; anything involving a float yields a
/// float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    /// Integer amount
    Int(i64),
    /// Floating-point amount
    Float(f64),
}

impl Numeric {
    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(i) => write!(f, "{}", i),
            Numeric::Float(x) => write!(f, "{:?}", x),
        }
    }
}

impl From<i64> for Numeric {
    fn from(v: i64) -> Self {
        Numeric::Int(v)
    }
}

impl From<i32> for Numeric {
    fn from(v: i32) -> Self {
        Numeric::Int(v as i64)
    }
}

impl From<f64> for Numeric {
    fn from(v: f64) -> Self {
        Numeric::Float(v)
    }
}

/// One structural edit in a patch batch
///
/// Paths are kept as written and parsed when the batch is applied, so a
/// malformed path surfaces as `InvalidPatch` naming this operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    /// Set a field, creating intermediate objects; inserts into arrays
    Add {
        /// Target path
        path: String,
        /// Value to add
        value: JsonValue,
    },
    /// Remove an existing field or array element
    Remove {
        /// Target path
        path: String,
    },
    /// Add a number to a numeric field
    #[serde(rename = "incr")]
    Increment {
        /// Target path
        path: String,
        /// Amount to add
        value: Numeric,
    },
    /// Push onto the end of an existing array
    Append {
        /// Path to the array (a trailing `-` is accepted)
        path: String,
        /// Element to push
        value: JsonValue,
    },
    /// Set a field, creating intermediate objects; replaces array elements
    Set {
        /// Target path
        path: String,
        /// Value to set
        value: JsonValue,
    },
    /// Replace an existing value
    Replace {
        /// Target path
        path: String,
        /// Replacement value
        value: JsonValue,
    },
}

impl PatchOperation {
    /// Create an Add operation
    pub fn add(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        PatchOperation::Add {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Create a Remove operation
    pub fn remove(path: impl Into<String>) -> Self {
        PatchOperation::Remove { path: path.into() }
    }

    /// Create an Increment operation
    pub fn increment(path: impl Into<String>, amount: impl Into<Numeric>) -> Self {
        PatchOperation::Increment {
            path: path.into(),
            value: amount.into(),
        }
    }

    /// Create an Append operation
    pub fn append(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        PatchOperation::Append {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Create a Set operation
    pub fn set(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        PatchOperation::Set {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Create a Replace operation
    pub fn replace(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        PatchOperation::Replace {
            path: path.into(),
            value: value.into(),
        }
    }

    /// The path as written
    pub fn path(&self) -> &str {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Increment { path, .. }
            | PatchOperation::Append { path, .. }
            | PatchOperation::Set { path, .. }
            | PatchOperation::Replace { path, .. } => path,
        }
    }

    /// Lowercase operation name
    pub fn name(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => "add",
            PatchOperation::Remove { .. } => "remove",
            PatchOperation::Increment { .. } => "incr",
            PatchOperation::Append { .. } => "append",
            PatchOperation::Set { .. } => "set",
            PatchOperation::Replace { .. } => "replace",
        }
    }
}

impl fmt::Display for PatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOperation::Remove { path } => write!(f, "remove {}", path),
            PatchOperation::Increment { path, value } => write!(f, "incr {} by {}", path, value),
            PatchOperation::Add { path, value }
            | PatchOperation::Append { path, value }
            | PatchOperation::Set { path, value }
            | PatchOperation::Replace { path, value } => {
                write!(f, "{} {} {}", self.name(), path, value)
            }
        }
    }
}

/// Applies patch batches all-or-nothing
#[derive(Debug, Clone)]
pub struct PatchEngine {
    schema: KeySchema,
    limits: DocumentLimits,
}

impl PatchEngine {
    /// Create an engine that protects the schema's key fields
    pub fn new(schema: KeySchema, limits: DocumentLimits) -> Self {
        Self { schema, limits }
    }

    /// Apply `operations` in order to a copy of `body`
    ///
    /// Returns the patched copy, or `InvalidPatch` for the first operation
    /// that cannot be applied. `body` itself is never modified.
    pub fn apply(&self, body: &JsonValue, operations: &[PatchOperation]) -> QuireResult<JsonValue> {
        if operations.is_empty() {
            return Err(QuireError::invalid_patch(0, "<empty batch>", "patch batch is empty"));
        }

        let mut working = body.as_inner().clone();
        for (index, op) in operations.iter().enumerate() {
            self.apply_one(&mut working, op)
                .map_err(|reason| QuireError::invalid_patch(index, op.to_string(), reason))?;
        }
        Ok(JsonValue::from(working))
    }

    fn apply_one(&self, root: &mut serde_json::Value, op: &PatchOperation) -> Result<(), String> {
        let path: JsonPath = op
            .path()
            .parse()
            .map_err(|e| format!("malformed path '{}': {}", op.path(), e))?;
        if path.is_root() {
            return Err("operation cannot target the document root".to_string());
        }
        path.validate(&self.limits).map_err(|e| e.to_string())?;
        if self.schema.is_protected(&path) {
            return Err(format!(
                "path '{}' touches the id or partition key, which cannot be patched",
                path
            ));
        }

        match op {
            PatchOperation::Add { value, .. } => {
                insert_at(root, &path, value.as_inner().clone(), ArrayWrite::Insert)
            }
            PatchOperation::Set { value, .. } => {
                insert_at(root, &path, value.as_inner().clone(), ArrayWrite::Overwrite)
            }
            PatchOperation::Replace { value, .. } => {
                let target = existing_mut(root, &path)?;
                *target = value.as_inner().clone();
                Ok(())
            }
            PatchOperation::Remove { .. } => remove_at(root, &path),
            PatchOperation::Increment { value, .. } => increment_at(root, &path, *value),
            PatchOperation::Append { value, .. } => append_at(root, &path, value.as_inner().clone()),
        }?;

        validate_limits(root, &self.limits).map_err(|e| e.to_string())
    }
}

#[derive(Clone, Copy)]
enum ArrayWrite {
    Insert,
    Overwrite,
}

/// Walk to the parent of `path`, optionally creating missing objects
fn parent_mut<'a>(
    root: &'a mut serde_json::Value,
    path: &JsonPath,
    create: bool,
) -> Result<&'a mut serde_json::Value, String> {
    let segments = path.segments();
    let mut current = root;
    for (depth, segment) in segments[..segments.len() - 1].iter().enumerate() {
        current = match current {
            serde_json::Value::Object(obj) => {
                if create && !obj.contains_key(segment) {
                    obj.insert(
                        segment.clone(),
                        serde_json::Value::Object(serde_json::Map::new()),
                    );
                }
                obj.get_mut(segment)
                    .ok_or_else(|| format!("path '{}' does not exist", prefix(path, depth + 1)))?
            }
            serde_json::Value::Array(arr) => {
                let len = arr.len();
                let idx = parse_index(segment)
                    .ok_or_else(|| format!("'{}' is not a valid array index", segment))?;
                arr.get_mut(idx)
                    .ok_or_else(|| format!("index {} out of bounds (length {})", idx, len))?
            }
            other => {
                return Err(format!(
                    "cannot traverse {} at '{}'",
                    value_type_name(other),
                    prefix(path, depth)
                ))
            }
        };
    }
    Ok(current)
}

fn prefix(path: &JsonPath, len: usize) -> JsonPath {
    JsonPath::from_segments(path.segments()[..len].to_vec())
}

fn last(path: &JsonPath) -> &str {
    path.last_segment().unwrap_or_default()
}

fn existing_mut<'a>(
    root: &'a mut serde_json::Value,
    path: &JsonPath,
) -> Result<&'a mut serde_json::Value, String> {
    get_at_path_mut(root, path).ok_or_else(|| format!("path '{}' does not exist", path))
}

fn insert_at(
    root: &mut serde_json::Value,
    path: &JsonPath,
    value: serde_json::Value,
    mode: ArrayWrite,
) -> Result<(), String> {
    let key = last(path);
    match parent_mut(root, path, true)? {
        serde_json::Value::Object(obj) => {
            obj.insert(key.to_string(), value);
            Ok(())
        }
        serde_json::Value::Array(arr) => {
            if key == END_OF_ARRAY {
                arr.push(value);
                return Ok(());
            }
            let idx =
                parse_index(key).ok_or_else(|| format!("'{}' is not a valid array index", key))?;
            match mode {
                ArrayWrite::Insert if idx <= arr.len() => arr.insert(idx, value),
                ArrayWrite::Overwrite if idx < arr.len() => arr[idx] = value,
                ArrayWrite::Overwrite if idx == arr.len() => arr.push(value),
                _ => {
                    return Err(format!(
                        "index {} out of bounds (length {})",
                        idx,
                        arr.len()
                    ))
                }
            }
            Ok(())
        }
        other => Err(format!("cannot add a field to {}", value_type_name(other))),
    }
}

fn remove_at(root: &mut serde_json::Value, path: &JsonPath) -> Result<(), String> {
    let key = last(path);
    let missing = || format!("path '{}' does not exist", path);
    match parent_mut(root, path, false)? {
        serde_json::Value::Object(obj) => obj.remove(key).map(|_| ()).ok_or_else(missing),
        serde_json::Value::Array(arr) => match parse_index(key) {
            Some(idx) if idx < arr.len() => {
                arr.remove(idx);
                Ok(())
            }
            _ => Err(missing()),
        },
        _ => Err(missing()),
    }
}

fn increment_at(root: &mut serde_json::Value, path: &JsonPath, amount: Numeric) -> Result<(), String> {
    if path.targets_end() {
        return Err("cannot increment the end of an array".to_string());
    }
    let Some(target) = get_at_path_mut(root, path) else {
        let initial = match amount {
            Numeric::Int(i) => serde_json::Value::from(i),
            Numeric::Float(f) => finite_number(f)?,
        };
        return insert_at(root, path, initial, ArrayWrite::Overwrite);
    };

    let serde_json::Value::Number(current) = &*target else {
        return Err(format!(
            "value at '{}' is a {}, not a number",
            path,
            value_type_name(target)
        ));
    };

    let next = match (current.as_i64(), amount) {
        (Some(existing), Numeric::Int(delta)) => existing
            .checked_add(delta)
            .map(serde_json::Value::from)
            .ok_or_else(|| format!("integer overflow incrementing '{}'", path))?,
        _ => {
            let existing = current
                .as_f64()
                .ok_or_else(|| format!("value at '{}' is not representable", path))?;
            finite_number(existing + amount.as_f64())?
        }
    };
    *target = next;
    Ok(())
}

fn finite_number(f: f64) -> Result<serde_json::Value, String> {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .ok_or_else(|| "result is not a finite number".to_string())
}

fn append_at(root: &mut serde_json::Value, path: &JsonPath, value: serde_json::Value) -> Result<(), String> {
    let array_path = if path.targets_end() {
        path.parent().unwrap_or_default()
    } else {
        path.clone()
    };
    match existing_mut(root, &array_path)? {
        serde_json::Value::Array(arr) => {
            arr.push(value);
            Ok(())
        }
        other => Err(format!(
            "path '{}' addresses a {}, not an array",
            array_path,
            value_type_name(other)
        )),
    }
}

//! JSON types for documents
//!
//! This module defines the value and addressing types used by every other
//! layer:
//! - JsonValue: Newtype wrapper around serde_json::Value
//! - JsonPath: Slash-delimited pointer into a document (e.g. `/childObject/someProperty`)
//! - DocumentLimits: Size, depth and path-length limits enforced on writes
//! - Path helpers: `get_at_path`, `get_at_path_mut`, `json_equals`
//!
//! # Document Size Limits
//!
//! | Limit | Default | Field |
//! |-------|---------|-------|
//! | Max document size | 2 MiB | [`DocumentLimits::max_document_bytes`] |
//! | Max nesting depth | 128 levels | [`DocumentLimits::max_nesting_depth`] |
//! | Max path length | 128 segments | [`DocumentLimits::max_path_length`] |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// Document Size Limits
// =============================================================================

/// Default maximum document size in bytes (2 MiB)
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 2 * 1024 * 1024;

/// Default maximum nesting depth in a document
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 128;

/// Default maximum path length in segments
pub const DEFAULT_MAX_PATH_LENGTH: usize = 128;

/// Limits enforced on every stored document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLimits {
    /// Maximum serialized size in bytes
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
    /// Maximum nesting depth of objects/arrays
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
    /// Maximum number of segments in a patch path
    #[serde(default = "default_max_path_length")]
    pub max_path_length: usize,
}

fn default_max_document_bytes() -> usize {
    DEFAULT_MAX_DOCUMENT_BYTES
}

fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_NESTING_DEPTH
}

fn default_max_path_length() -> usize {
    DEFAULT_MAX_PATH_LENGTH
}

impl Default for DocumentLimits {
    fn default() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
        }
    }
}

/// Error type for document limit violations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitError {
    /// Document exceeds maximum size
    #[error("document size {size} exceeds maximum of {max} bytes")]
    DocumentTooLarge {
        /// Actual document size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// Document nesting exceeds maximum depth
    #[error("document nesting depth {depth} exceeds maximum of {max} levels")]
    NestingTooDeep {
        /// Actual nesting depth
        depth: usize,
        /// Maximum allowed depth
        max: usize,
    },

    /// Path exceeds maximum length
    #[error("path length {length} exceeds maximum of {max} segments")]
    PathTooLong {
        /// Actual path length
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
}

// =============================================================================
// JsonValue
// =============================================================================

/// JSON value wrapper
///
/// Newtype around serde_json::Value providing:
/// - Direct access to underlying serde_json::Value via Deref/DerefMut
/// - Easy construction from common types
/// - Limit validation
///
/// # Examples
///
/// ```
/// use quire_core::JsonValue;
///
/// let obj = JsonValue::object();
/// let s = JsonValue::from("hello");
/// let n = JsonValue::from(42i64);
///
/// assert!(obj.is_object());
/// assert_eq!(s.as_str(), Some("hello"));
/// assert_eq!(n.as_i64(), Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonValue(serde_json::Value);

impl JsonValue {
    /// Create a null JSON value
    pub fn null() -> Self {
        JsonValue(serde_json::Value::Null)
    }

    /// Create an empty JSON object
    pub fn object() -> Self {
        JsonValue(serde_json::Value::Object(serde_json::Map::new()))
    }

    /// Create an empty JSON array
    pub fn array() -> Self {
        JsonValue(serde_json::Value::Array(Vec::new()))
    }

    /// Get the underlying serde_json::Value
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }

    /// Get a reference to the underlying serde_json::Value
    pub fn as_inner(&self) -> &serde_json::Value {
        &self.0
    }

    /// Get a mutable reference to the underlying serde_json::Value
    pub fn as_inner_mut(&mut self) -> &mut serde_json::Value {
        &mut self.0
    }

    /// Serialize to compact JSON string
    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }

    /// Serialized size in bytes (for limit checking)
    pub fn size_bytes(&self) -> usize {
        self.to_json_string().len()
    }

    /// Calculate the maximum nesting depth of this JSON value
    ///
    /// Returns 0 for primitives (null, bool, number, string),
    /// and counts nested objects/arrays.
    pub fn nesting_depth(&self) -> usize {
        nesting_depth(&self.0)
    }

    /// Validate all document limits
    pub fn validate(&self, limits: &DocumentLimits) -> Result<(), LimitError> {
        validate_limits(&self.0, limits)
    }
}

fn nesting_depth(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Null
        | serde_json::Value::Bool(_)
        | serde_json::Value::Number(_)
        | serde_json::Value::String(_) => 0,
        serde_json::Value::Array(arr) => 1 + arr.iter().map(nesting_depth).max().unwrap_or(0),
        serde_json::Value::Object(obj) => 1 + obj.values().map(nesting_depth).max().unwrap_or(0),
    }
}

/// Validate a raw value against document limits
///
/// Checks depth first (cheap on shallow documents), then size.
pub fn validate_limits(value: &serde_json::Value, limits: &DocumentLimits) -> Result<(), LimitError> {
    let depth = nesting_depth(value);
    if depth > limits.max_nesting_depth {
        return Err(LimitError::NestingTooDeep {
            depth,
            max: limits.max_nesting_depth,
        });
    }
    let size = value.to_string().len();
    if size > limits.max_document_bytes {
        return Err(LimitError::DocumentTooLarge {
            size,
            max: limits.max_document_bytes,
        });
    }
    Ok(())
}

impl FromStr for JsonValue {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map(JsonValue)
    }
}

impl Deref for JsonValue {
    type Target = serde_json::Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for JsonValue {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for JsonValue {
    fn default() -> Self {
        Self::null()
    }
}

impl From<serde_json::Value> for JsonValue {
    fn from(v: serde_json::Value) -> Self {
        JsonValue(v)
    }
}

impl From<JsonValue> for serde_json::Value {
    fn from(v: JsonValue) -> Self {
        v.0
    }
}

impl From<bool> for JsonValue {
    fn from(v: bool) -> Self {
        JsonValue(serde_json::Value::Bool(v))
    }
}

impl From<i64> for JsonValue {
    fn from(v: i64) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<i32> for JsonValue {
    fn from(v: i32) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<u64> for JsonValue {
    fn from(v: u64) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<f64> for JsonValue {
    fn from(v: f64) -> Self {
        JsonValue(
            serde_json::Number::from_f64(v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
        )
    }
}

impl From<&str> for JsonValue {
    fn from(v: &str) -> Self {
        JsonValue(serde_json::Value::String(v.to_string()))
    }
}

impl From<String> for JsonValue {
    fn from(v: String) -> Self {
        JsonValue(serde_json::Value::String(v))
    }
}

impl<T: Into<JsonValue>> From<Vec<T>> for JsonValue {
    fn from(v: Vec<T>) -> Self {
        JsonValue(serde_json::Value::Array(
            v.into_iter().map(|x| x.into().0).collect(),
        ))
    }
}

// =============================================================================
// JsonPath
// =============================================================================

/// Segment meaning "one past the last element" of an array
pub const END_OF_ARRAY: &str = "-";

/// Error type for JSON path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Non-root path without a leading `/`
    #[error("path must start with '/'")]
    MissingLeadingSlash,
    /// `//` or trailing `/`
    #[error("empty segment at position {0}")]
    EmptySegment(usize),
    /// `~` not followed by `0` or `1`
    #[error("invalid escape sequence at position {0}")]
    InvalidEscape(usize),
    /// `-` used anywhere but the final segment
    #[error("'-' is only allowed as the final segment (position {0})")]
    MisplacedEnd(usize),
}

/// A slash-delimited path into a JSON document
///
/// Segments name object fields, or array positions when the parent is an
/// array. A trailing `-` addresses the end of an array.
///
/// # Path Syntax
///
/// | Syntax | Meaning |
/// |--------|---------|
/// | (empty) | Root |
/// | `/name` | Top-level field |
/// | `/childObject/someProperty` | Nested field |
/// | `/childArray/0` | First array element |
/// | `/childArray/-` | End of array |
/// | `~0`, `~1` | Literal `~` and `/` inside a segment |
///
/// # Examples
///
/// ```
/// use quire_core::JsonPath;
///
/// let path: JsonPath = "/childArray/-".parse().unwrap();
/// assert_eq!(path.len(), 2);
/// assert!(path.targets_end());
///
/// let parent = JsonPath::root().key("childArray");
/// assert!(parent.is_ancestor_of(&path));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct JsonPath {
    segments: Vec<String>,
}

impl JsonPath {
    /// Create the root path (empty path)
    pub fn root() -> Self {
        JsonPath {
            segments: Vec::new(),
        }
    }

    /// Create a path from already-unescaped segments
    pub fn from_segments(segments: Vec<String>) -> Self {
        JsonPath { segments }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Get the number of segments in the path
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root path
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a segment (builder pattern)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(key.into());
        self
    }

    /// Get the parent path (None if root)
    pub fn parent(&self) -> Option<JsonPath> {
        if self.segments.is_empty() {
            None
        } else {
            let mut parent = self.clone();
            parent.segments.pop();
            Some(parent)
        }
    }

    /// Get the last segment (None if root)
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// True if the final segment is the end-of-array marker
    pub fn targets_end(&self) -> bool {
        self.last_segment() == Some(END_OF_ARRAY)
    }

    /// Check if this path is an ancestor of another (or equal)
    pub fn is_ancestor_of(&self, other: &JsonPath) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a == b)
    }

    /// Check if two paths overlap (one is ancestor/descendant of the other)
    pub fn overlaps(&self, other: &JsonPath) -> bool {
        self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }

    /// Validate path length limit
    pub fn validate(&self, limits: &DocumentLimits) -> Result<(), LimitError> {
        let length = self.segments.len();
        if length > limits.max_path_length {
            Err(LimitError::PathTooLong {
                length,
                max: limits.max_path_length,
            })
        } else {
            Ok(())
        }
    }

    /// Render as a pointer string, escaping `~` and `/`
    pub fn to_path_string(&self) -> String {
        let mut result = String::new();
        for seg in &self.segments {
            result.push('/');
            result.push_str(&seg.replace('~', "~0").replace('/', "~1"));
        }
        result
    }
}

impl FromStr for JsonPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(JsonPath::root());
        }
        let rest = s
            .strip_prefix('/')
            .ok_or(PathParseError::MissingLeadingSlash)?;

        let raw: Vec<&str> = rest.split('/').collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut pos = 1;
        for (i, part) in raw.iter().enumerate() {
            if part.is_empty() {
                return Err(PathParseError::EmptySegment(pos));
            }
            if *part == END_OF_ARRAY && i + 1 != raw.len() {
                return Err(PathParseError::MisplacedEnd(pos));
            }
            segments.push(unescape_segment(part, pos)?);
            pos += part.len() + 1;
        }
        Ok(JsonPath { segments })
    }
}

fn unescape_segment(part: &str, start: usize) -> Result<String, PathParseError> {
    let mut out = String::with_capacity(part.len());
    let mut chars = part.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some((_, '0')) => out.push('~'),
                Some((_, '1')) => out.push('/'),
                _ => return Err(PathParseError::InvalidEscape(start + i)),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}

// =============================================================================
// Path Operations
// =============================================================================

/// Parse an array index segment (`0`, `17`; no sign, no leading zeros)
pub fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Get value at path within a JSON document
///
/// Returns `None` if any segment is missing or traverses a scalar.
///
/// ```
/// use quire_core::json::{get_at_path, JsonPath};
///
/// let doc = serde_json::json!({"childArray": ["apple", "banana"]});
/// let path: JsonPath = "/childArray/1".parse().unwrap();
/// assert_eq!(get_at_path(&doc, &path).and_then(|v| v.as_str()), Some("banana"));
/// ```
pub fn get_at_path<'a>(value: &'a serde_json::Value, path: &JsonPath) -> Option<&'a serde_json::Value> {
    let mut current = value;
    for segment in path.segments() {
        current = match current {
            serde_json::Value::Object(obj) => obj.get(segment)?,
            serde_json::Value::Array(arr) => arr.get(parse_index(segment)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Get mutable reference to value at path within a JSON document
pub fn get_at_path_mut<'a>(
    value: &'a mut serde_json::Value,
    path: &JsonPath,
) -> Option<&'a mut serde_json::Value> {
    let mut current = value;
    for segment in path.segments() {
        current = match current {
            serde_json::Value::Object(obj) => obj.get_mut(segment)?,
            serde_json::Value::Array(arr) => arr.get_mut(parse_index(segment)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Type name for error messages
pub fn value_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Structural equality with numbers compared by value
///
/// `serde_json` keeps `1` and `1.0` apart; documents and query parameters
/// should not.
pub fn json_equals(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    use serde_json::Value;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| json_equals(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| json_equals(v, other)))
        }
        _ => a == b,
    }
}

//! Partition-key values
//!
//! A partition key is the scalar found at a container's partition-key path.
//! Documents sharing one value live in the same partition.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 2^63 as f64, the first float past `i64::MAX`
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
/// 2^64 as f64, the first float past `u64::MAX`
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;
/// 2^127 as f64, the first float past `i128::MAX`
const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

/// Scalar partition-key value
///
/// Objects and arrays cannot be partition keys. Integers are kept exactly,
/// so distinct integers beyond 2^53 stay distinct. Numbers still compare by
/// value across variants: `1`, `1u64` and `1.0` address the same partition.
///
/// ## Ordering
///
/// `Null < Bool < Number < String`, then by value within a kind. Used to
/// give cross-partition scans a stable order.
#[derive(Debug, Clone)]
pub enum PartitionKey {
    /// JSON null
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer above `i64::MAX`
    UInt(u64),
    /// Non-integral or out-of-range number
    Float(f64),
    /// String
    String(String),
}

/// Exact numeric form used by Eq, Hash and Ord
#[derive(Clone, Copy)]
enum Exact {
    Int(i128),
    Float(f64),
}

impl Exact {
    fn of(f: f64) -> Self {
        if f.fract() == 0.0 && f > -I128_BOUND && f < I128_BOUND {
            Exact::Int(f as i128)
        } else {
            Exact::Float(f)
        }
    }

    fn cmp(self, other: Exact) -> Ordering {
        match (self, other) {
            (Exact::Int(a), Exact::Int(b)) => a.cmp(&b),
            (Exact::Float(a), Exact::Float(b)) => a.total_cmp(&b),
            (Exact::Int(a), Exact::Float(b)) => cmp_int_float(a, b),
            (Exact::Float(a), Exact::Int(b)) => cmp_int_float(b, a).reverse(),
        }
    }
}

/// `f` is never integral inside the i128 range here, so the result is
/// never `Equal`.
fn cmp_int_float(i: i128, f: f64) -> Ordering {
    if f.is_nan() || f >= I128_BOUND {
        Ordering::Less
    } else if f <= -I128_BOUND {
        Ordering::Greater
    } else if i <= f.floor() as i128 {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

impl PartitionKey {
    /// Extract a partition key from a JSON value
    ///
    /// Returns `None` for objects, arrays and non-finite numbers.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(PartitionKey::Null),
            serde_json::Value::Bool(b) => Some(PartitionKey::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(PartitionKey::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Some(PartitionKey::UInt(u))
                } else {
                    n.as_f64().filter(|f| f.is_finite()).map(PartitionKey::from)
                }
            }
            serde_json::Value::String(s) => Some(PartitionKey::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Convert back to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PartitionKey::Null => serde_json::Value::Null,
            PartitionKey::Bool(b) => serde_json::Value::Bool(*b),
            PartitionKey::Int(i) => serde_json::Value::from(*i),
            PartitionKey::UInt(u) => serde_json::Value::from(*u),
            PartitionKey::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            PartitionKey::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Get the string value, if this is a string key
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PartitionKey::String(s) => Some(s),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            PartitionKey::Null => 0,
            PartitionKey::Bool(_) => 1,
            PartitionKey::Int(_) | PartitionKey::UInt(_) | PartitionKey::Float(_) => 2,
            PartitionKey::String(_) => 3,
        }
    }

    fn exact(&self) -> Option<Exact> {
        match self {
            PartitionKey::Int(i) => Some(Exact::Int(i128::from(*i))),
            PartitionKey::UInt(u) => Some(Exact::Int(i128::from(*u))),
            PartitionKey::Float(f) => Some(Exact::of(*f)),
            _ => None,
        }
    }
}

impl PartialEq for PartitionKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PartitionKey {}

impl Hash for PartitionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            PartitionKey::Null => {}
            PartitionKey::Bool(b) => b.hash(state),
            PartitionKey::String(s) => s.hash(state),
            number => match number.exact() {
                Some(Exact::Int(i)) => i.hash(state),
                Some(Exact::Float(f)) => f.to_bits().hash(state),
                None => {}
            },
        }
    }
}

impl PartialOrd for PartitionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PartitionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PartitionKey::Bool(a), PartitionKey::Bool(b)) => a.cmp(b),
            (PartitionKey::String(a), PartitionKey::String(b)) => a.cmp(b),
            _ => match (self.exact(), other.exact()) {
                (Some(a), Some(b)) => a.cmp(b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl Serialize for PartitionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PartitionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        PartitionKey::from_json(&value)
            .ok_or_else(|| D::Error::custom("partition key must be a finite JSON scalar"))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.to_json())
    }
}

impl From<&str> for PartitionKey {
    fn from(v: &str) -> Self {
        PartitionKey::String(v.to_string())
    }
}

impl From<String> for PartitionKey {
    fn from(v: String) -> Self {
        PartitionKey::String(v)
    }
}

impl From<bool> for PartitionKey {
    fn from(v: bool) -> Self {
        PartitionKey::Bool(v)
    }
}

impl From<i64> for PartitionKey {
    fn from(v: i64) -> Self {
        PartitionKey::Int(v)
    }
}

impl From<u64> for PartitionKey {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => PartitionKey::Int(i),
            Err(_) => PartitionKey::UInt(v),
        }
    }
}

/// Integral floats fold into the integer variants.
impl From<f64> for PartitionKey {
    fn from(v: f64) -> Self {
        if v.fract() == 0.0 && v >= -I64_BOUND && v < I64_BOUND {
            PartitionKey::Int(v as i64)
        } else if v.fract() == 0.0 && v >= 0.0 && v < U64_BOUND {
            PartitionKey::UInt(v as u64)
        } else {
            PartitionKey::Float(v)
        }
    }
}

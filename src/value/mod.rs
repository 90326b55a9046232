//! Decoded directory value tree.
//!
//! A [`Value`] is one of six wire types.  Trees are built once by
//! [`decode`] and are read-only afterwards.

pub mod decode;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

pub use decode::{decode_root, Decoder, DecodeOptions, DEFAULT_MAX_DEPTH};

// ── ValueType ────────────────────────────────────────────────────────────────

/// Wire tag of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null    = 1,
    Hash    = 2,
    Array   = 3,
    String  = 4,
    Integer = 5,
    Double  = 6,
}

impl ValueType {
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ValueType {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, u8> {
        match tag {
            1 => Ok(ValueType::Null),
            2 => Ok(ValueType::Hash),
            3 => Ok(ValueType::Array),
            4 => Ok(ValueType::String),
            5 => Ok(ValueType::Integer),
            6 => Ok(ValueType::Double),
            other => Err(other),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::Null    => "null",
            ValueType::Hash    => "hash",
            ValueType::Array   => "array",
            ValueType::String  => "string",
            ValueType::Integer => "integer",
            ValueType::Double  => "double",
        })
    }
}

/// Display name for a raw tag, including unknown ones.
pub fn tag_name(tag: u8) -> String {
    match ValueType::try_from(tag) {
        Ok(t)  => t.to_string(),
        Err(t) => format!("unknown ({t})"),
    }
}

// ── Value ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct HashEntry {
    pub key:   String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// Entries sorted by key (byte-wise); duplicate keys are kept.
    Hash(Vec<HashEntry>),
    Array(Vec<Value>),
    String(String),
    Integer(i64),
    Double(f64),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null       => ValueType::Null,
            Value::Hash(_)    => ValueType::Hash,
            Value::Array(_)   => ValueType::Array,
            Value::String(_)  => ValueType::String,
            Value::Integer(_) => ValueType::Integer,
            Value::Double(_)  => ValueType::Double,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_hash(&self) -> Option<&[HashEntry]> {
        match self {
            Value::Hash(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Case-insensitive key lookup on a hash.
    ///
    /// Binary search over the byte-wise sorted entries, lower-casing both the
    /// needle and each probed key.  Keys whose case changes their relative
    /// order can be missed; this mirrors how existing containers are read.
    /// Returns `None` for non-hash values and missing keys.
    pub fn find(&self, name: &str) -> Option<&Value> {
        let entries = self.as_hash()?;
        let needle = name.to_lowercase();
        let idx = entries.partition_point(|e| e.key.to_lowercase() < needle);
        entries
            .get(idx)
            .filter(|e| e.key.to_lowercase() == needle)
            .map(|e| &e.value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null       => serializer.serialize_unit(),
            Value::String(s)  => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Double(d)  => serializer.serialize_f64(*d),
            Value::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.len()))?;
                for v in a {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Value::Hash(h) => {
                let mut map = serializer.serialize_map(Some(h.len()))?;
                for e in h {
                    map.serialize_entry(&e.key, &e.value)?;
                }
                map.end()
            }
        }
    }
}

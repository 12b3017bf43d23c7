//! Open, dynamically-typed destination slot.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::value::LatLng;

/// Best-effort native rendition of any wire value.
///
/// References materialize as their path string. `Null` stands for an explicit
/// wire null and is also the state of a slot nothing was decoded into.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Dynamic {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    Bytes(Vec<u8>),
    GeoPoint(LatLng),
    Array(Vec<Dynamic>),
    Map(IndexMap<String, Dynamic>),
}

impl Dynamic {
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Dynamic::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Doubles, and integers widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Dynamic::Double(f) => Some(*f),
            Dynamic::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Dynamic>> {
        match self {
            Dynamic::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up `key` when this is a map.
    pub fn get(&self, key: &str) -> Option<&Dynamic> {
        self.as_map().and_then(|entries| entries.get(key))
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Dynamic::Bool(value)
    }
}

impl From<i64> for Dynamic {
    fn from(value: i64) -> Self {
        Dynamic::Integer(value)
    }
}

impl From<f64> for Dynamic {
    fn from(value: f64) -> Self {
        Dynamic::Double(value)
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::String(value.to_owned())
    }
}

impl From<String> for Dynamic {
    fn from(value: String) -> Self {
        Dynamic::String(value)
    }
}

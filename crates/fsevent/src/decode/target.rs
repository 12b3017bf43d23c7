//! Destination capabilities.
//!
//! A destination exposes itself to the decoder as a [`Target`]: a mutable
//! view tagged with one of a small, closed set of capabilities. The decoder
//! dispatches on that tag alone, so any type implementing [`Decode`] can be
//! populated without the decoder knowing it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use super::dynamic::Dynamic;
use super::error::DecodeError;
use crate::value::LatLng;

/// Whether a decode step changed its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written,
    Untouched,
}

/// Continuation handed to slots that own their pointee or element.
pub type Fill<'f> = dyn FnMut(Target<'_>) -> Result<Outcome, DecodeError> + 'f;

/// Mutable view of a destination, tagged by capability.
pub enum Target<'a> {
    Bool(&'a mut bool),
    Int(&'a mut i64),
    Float(&'a mut f64),
    Str(&'a mut String),
    Timestamp(&'a mut DateTime<Utc>),
    Bytes(&'a mut Vec<u8>),
    /// Only decodable through an optional.
    GeoPoint(&'a mut LatLng),
    Optional(&'a mut dyn OptionalSlot),
    /// Growable or fixed-size sequence.
    Sequence(&'a mut dyn SequenceSlot),
    Mapping(&'a mut dyn MappingSlot),
    Record(&'a mut dyn Record),
    Dynamic(&'a mut Dynamic),
    /// A type the decoder has no rule for; the payload names it.
    Unsupported(&'static str),
}

impl Target<'_> {
    /// Short name of the capability, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Target::Bool(_) => "bool",
            Target::Int(_) => "i64",
            Target::Float(_) => "f64",
            Target::Str(_) => "String",
            Target::Timestamp(_) => "DateTime<Utc>",
            Target::Bytes(_) => "Vec<u8>",
            Target::GeoPoint(_) => "LatLng",
            Target::Optional(_) => "Option",
            Target::Sequence(_) => "sequence",
            Target::Mapping(_) => "map",
            Target::Record(_) => "record",
            Target::Dynamic(_) => "Dynamic",
            Target::Unsupported(name) => *name,
        }
    }
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", self.shape())
    }
}

/// A type the decoder can populate.
///
/// Implement it for your own records with `#[derive(Decode)]`.
pub trait Decode {
    fn target(&mut self) -> Target<'_>;

    /// Capability of `Vec<Self>`. Overridden by `u8` so that `Vec<u8>`
    /// decodes from `bytesValue` instead of an array.
    #[doc(hidden)]
    fn vec_target(items: &mut Vec<Self>) -> Target<'_>
    where
        Self: Sized + Default,
    {
        Target::Sequence(items)
    }
}

/// `Option`-like pointer to a lazily allocated pointee.
pub trait OptionalSlot {
    fn clear(&mut self);

    /// Runs `fill` against the pointee, allocating one if unset. A freshly
    /// allocated pointee is kept only when `fill` reports a write.
    fn fill(&mut self, fill: &mut Fill<'_>) -> Result<Outcome, DecodeError>;
}

/// Ordered sequence of decodable elements.
pub trait SequenceSlot {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Some(n)` for sequences that cannot change length.
    fn fixed_len(&self) -> Option<usize> {
        None
    }

    /// Prepares the sequence for `len` wire elements. Growable sequences are
    /// reallocated with fresh elements when too short and truncated when too
    /// long; fixed sequences reset the slots from `len` onwards.
    fn reset(&mut self, len: usize);

    /// Target for the element at `index`, which is below the length set by
    /// the last [`reset`](SequenceSlot::reset).
    fn element(&mut self, index: usize) -> Target<'_>;
}

/// Kind of a mapping's key type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    String,
    Integer,
    Boolean,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyKind::String => "string",
            KeyKind::Integer => "integer",
            KeyKind::Boolean => "boolean",
        })
    }
}

/// Key type of a mapping destination.
///
/// Wire maps are keyed by strings, so only [`KeyKind::String`] keys are
/// decodable. The `i64` and `bool` impls only make such mappings
/// representable: the decoder rejects them with `UnsupportedShape` from
/// [`KeyKind`] alone and never calls their `from_wire_key`.
pub trait MapKey: Sized {
    const KIND: KeyKind;

    /// Converts a wire key. `None` skips the entry.
    fn from_wire_key(key: &str) -> Option<Self>;
}

impl MapKey for String {
    const KIND: KeyKind = KeyKind::String;

    fn from_wire_key(key: &str) -> Option<Self> {
        Some(key.to_owned())
    }
}

impl MapKey for i64 {
    const KIND: KeyKind = KeyKind::Integer;

    fn from_wire_key(key: &str) -> Option<Self> {
        key.parse().ok()
    }
}

impl MapKey for bool {
    const KIND: KeyKind = KeyKind::Boolean;

    fn from_wire_key(key: &str) -> Option<Self> {
        key.parse().ok()
    }
}

/// Mapping from wire keys to decodable values.
pub trait MappingSlot {
    fn key_kind(&self) -> KeyKind;

    /// Decodes a fresh element with `fill` and inserts it under `key`,
    /// replacing any previous entry.
    fn insert_with(&mut self, key: &str, fill: &mut Fill<'_>) -> Result<Outcome, DecodeError>;
}

/// Declared field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Rust identifier, reported alongside the wire path in trace logs.
    pub name: &'static str,
    /// `"wireName,modifier,..."`.
    pub tag: &'static str,
    /// Only `pub` fields are addressable by the wire format.
    pub exported: bool,
}

/// A structure with named, tagged fields.
pub trait Record {
    /// Declared fields, in declaration order.
    fn fields(&self) -> &'static [FieldSpec];

    /// Target for the exported field at `index` in [`fields`](Record::fields).
    fn field(&mut self, index: usize) -> Target<'_>;
}

impl Decode for bool {
    fn target(&mut self) -> Target<'_> {
        Target::Bool(self)
    }
}

impl Decode for i64 {
    fn target(&mut self) -> Target<'_> {
        Target::Int(self)
    }
}

impl Decode for f64 {
    fn target(&mut self) -> Target<'_> {
        Target::Float(self)
    }
}

impl Decode for String {
    fn target(&mut self) -> Target<'_> {
        Target::Str(self)
    }
}

impl Decode for DateTime<Utc> {
    fn target(&mut self) -> Target<'_> {
        Target::Timestamp(self)
    }
}

impl Decode for LatLng {
    fn target(&mut self) -> Target<'_> {
        Target::GeoPoint(self)
    }
}

impl Decode for Dynamic {
    fn target(&mut self) -> Target<'_> {
        Target::Dynamic(self)
    }
}

impl Decode for u8 {
    fn target(&mut self) -> Target<'_> {
        Target::Unsupported("u8")
    }

    fn vec_target(items: &mut Vec<Self>) -> Target<'_> {
        Target::Bytes(items)
    }
}

impl<T: Decode + ?Sized> Decode for Box<T> {
    fn target(&mut self) -> Target<'_> {
        (**self).target()
    }
}

impl<T: Decode + Default> Decode for Option<T> {
    fn target(&mut self) -> Target<'_> {
        Target::Optional(self)
    }
}

impl<T: Decode + Default> OptionalSlot for Option<T> {
    fn clear(&mut self) {
        *self = None;
    }

    fn fill(&mut self, fill: &mut Fill<'_>) -> Result<Outcome, DecodeError> {
        match self {
            Some(pointee) => fill(pointee.target()),
            None => {
                let mut pointee = T::default();
                let outcome = fill(pointee.target())?;
                if outcome == Outcome::Written {
                    *self = Some(pointee);
                }
                Ok(outcome)
            }
        }
    }
}

impl<T: Decode + Default> Decode for Vec<T> {
    fn target(&mut self) -> Target<'_> {
        T::vec_target(self)
    }
}

impl<T: Decode + Default> SequenceSlot for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn reset(&mut self, len: usize) {
        if self.len() < len {
            self.clear();
            self.resize_with(len, T::default);
        } else {
            self.truncate(len);
        }
    }

    fn element(&mut self, index: usize) -> Target<'_> {
        self[index].target()
    }
}

impl<T: Decode + Default, const N: usize> Decode for [T; N] {
    fn target(&mut self) -> Target<'_> {
        Target::Sequence(self)
    }
}

impl<T: Decode + Default, const N: usize> SequenceSlot for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn fixed_len(&self) -> Option<usize> {
        Some(N)
    }

    fn reset(&mut self, len: usize) {
        for slot in self.iter_mut().skip(len) {
            *slot = T::default();
        }
    }

    fn element(&mut self, index: usize) -> Target<'_> {
        self[index].target()
    }
}

fn insert_fresh<K, V>(
    key: &str,
    fill: &mut Fill<'_>,
    insert: impl FnOnce(K, V),
) -> Result<Outcome, DecodeError>
where
    K: MapKey,
    V: Decode + Default,
{
    let Some(key) = K::from_wire_key(key) else {
        return Ok(Outcome::Untouched);
    };
    let mut element = V::default();
    fill(element.target())?;
    insert(key, element);
    Ok(Outcome::Written)
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Decode + Default,
    S: BuildHasher,
{
    fn target(&mut self) -> Target<'_> {
        Target::Mapping(self)
    }
}

impl<K, V, S> MappingSlot for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Decode + Default,
    S: BuildHasher,
{
    fn key_kind(&self) -> KeyKind {
        K::KIND
    }

    fn insert_with(&mut self, key: &str, fill: &mut Fill<'_>) -> Result<Outcome, DecodeError> {
        insert_fresh(key, fill, |k, v| {
            self.insert(k, v);
        })
    }
}

impl<K, V> Decode for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Decode + Default,
{
    fn target(&mut self) -> Target<'_> {
        Target::Mapping(self)
    }
}

impl<K, V> MappingSlot for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Decode + Default,
{
    fn key_kind(&self) -> KeyKind {
        K::KIND
    }

    fn insert_with(&mut self, key: &str, fill: &mut Fill<'_>) -> Result<Outcome, DecodeError> {
        insert_fresh(key, fill, |k, v| {
            self.insert(k, v);
        })
    }
}

impl<K, V, S> Decode for IndexMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Decode + Default,
    S: BuildHasher,
{
    fn target(&mut self) -> Target<'_> {
        Target::Mapping(self)
    }
}

impl<K, V, S> MappingSlot for IndexMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Decode + Default,
    S: BuildHasher,
{
    fn key_kind(&self) -> KeyKind {
        K::KIND
    }

    fn insert_with(&mut self, key: &str, fill: &mut Fill<'_>) -> Result<Outcome, DecodeError> {
        insert_fresh(key, fill, |k, v| {
            self.insert(k, v);
        })
    }
}

//! Type-directed decoder.
//!
//! Walks a destination's [`Target`] alongside the wire value tree. Dispatch is
//! driven by the destination capability; the wire kind is expected to match.
//!
//! Decoding is fail-fast and not transactional: the first error aborts the
//! call and fields written before it stay written. [`Decoder::decode_tracked`]
//! reports which fields those are.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value as Json;

use super::dynamic::Dynamic;
use super::error::{DecodeError, DecodeReport, PartialDecode};
use super::options::DecoderOptions;
use super::tag::FieldTag;
use super::target::{Decode, KeyKind, MappingSlot, Outcome, Record, SequenceSlot, Target};
use crate::value::{TaggedValue, ValueTree, WireKind};

/// Decodes value trees into [`Decode`] destinations.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    options: DecoderOptions,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Populates `dest` from the fields of `tree`.
    ///
    /// `dest` must be a record, a string-keyed map, an open slot, or an
    /// optional wrapping one of those.
    pub fn decode<D>(&self, tree: &ValueTree, dest: &mut D) -> Result<(), DecodeError>
    where
        D: Decode + ?Sized,
    {
        self.decode_tracked(tree, dest)
            .map(|_| ())
            .map_err(PartialDecode::into_error)
    }

    /// Like [`decode`](Decoder::decode), also reporting the record fields
    /// written, including those written before a failure.
    pub fn decode_tracked<D>(
        &self,
        tree: &ValueTree,
        dest: &mut D,
    ) -> Result<DecodeReport, PartialDecode>
    where
        D: Decode + ?Sized,
    {
        let mut walk = Walk {
            options: &self.options,
            written: Vec::new(),
            depth: 0,
        };
        match walk.root(dest.target(), &tree.fields) {
            Ok(_) => Ok(DecodeReport::new(walk.written)),
            Err(error) => {
                tracing::debug!(
                    document = %tree.name,
                    field = error.field(),
                    written = walk.written.len(),
                    "decode failed: {error}"
                );
                Err(PartialDecode {
                    error,
                    written: walk.written,
                })
            }
        }
    }
}

/// Decodes `tree` into `dest` with default options.
pub fn decode<D>(tree: &ValueTree, dest: &mut D) -> Result<(), DecodeError>
where
    D: Decode + ?Sized,
{
    Decoder::new().decode(tree, dest)
}

/// State of one decode call.
struct Walk<'o> {
    options: &'o DecoderOptions,
    written: Vec<String>,
    depth: usize,
}

impl Walk<'_> {
    fn root(
        &mut self,
        target: Target<'_>,
        fields: &IndexMap<String, TaggedValue>,
    ) -> Result<Outcome, DecodeError> {
        match target {
            Target::Record(record) => self.record(record, fields, ""),
            Target::Mapping(mapping) => self.mapping(mapping, fields, ""),
            Target::Dynamic(slot) => {
                *slot = Dynamic::Map(self.materialize_map(fields, "")?);
                Ok(Outcome::Written)
            }
            Target::Optional(slot) => slot.fill(&mut |pointee| self.root(pointee, fields)),
            other => Err(DecodeError::InvalidDestination {
                shape: other.shape(),
            }),
        }
    }

    fn value(
        &mut self,
        target: Target<'_>,
        value: &TaggedValue,
        path: &str,
    ) -> Result<Outcome, DecodeError> {
        match target {
            Target::Bool(slot) => match value {
                TaggedValue::Boolean(b) => Ok(write(slot, *b)),
                _ => self.not_accepted(value, &[WireKind::Boolean], path),
            },
            Target::Int(slot) => match value {
                TaggedValue::Integer(text) => Ok(write(slot, parse_int(text, path)?)),
                _ => self.not_accepted(value, &[WireKind::Integer], path),
            },
            Target::Float(slot) => match value {
                TaggedValue::Double(f) => Ok(write(slot, *f)),
                TaggedValue::Integer(text) if self.options.widen_integers => {
                    Ok(write(slot, parse_int(text, path)? as f64))
                }
                _ if self.options.widen_integers => {
                    self.not_accepted(value, &[WireKind::Double, WireKind::Integer], path)
                }
                _ => self.not_accepted(value, &[WireKind::Double], path),
            },
            Target::Str(slot) => match value {
                TaggedValue::String(s) | TaggedValue::Reference(s) => {
                    slot.clone_from(s);
                    Ok(Outcome::Written)
                }
                _ => self.not_accepted(value, &[WireKind::String, WireKind::Reference], path),
            },
            Target::Timestamp(slot) => match value {
                TaggedValue::Timestamp(text) => Ok(write(slot, parse_timestamp(text, path)?)),
                _ => self.not_accepted(value, &[WireKind::Timestamp], path),
            },
            Target::Bytes(slot) => match value {
                TaggedValue::Bytes(text) => Ok(write(slot, decode_bytes(text, path)?)),
                _ => self.not_accepted(value, &[WireKind::Bytes], path),
            },
            Target::GeoPoint(_) => Err(DecodeError::UnsupportedShape {
                field: path.to_owned(),
                shape: "LatLng outside Option".to_owned(),
            }),
            Target::Optional(slot) => {
                if value.is_null() {
                    slot.clear();
                    return Ok(Outcome::Written);
                }
                slot.fill(&mut |pointee| self.pointee(pointee, value, path))
            }
            Target::Sequence(sequence) => match value {
                TaggedValue::Array(items) => self.sequence(sequence, items, path),
                _ => self.compound_mismatch(value, WireKind::Array, path),
            },
            Target::Mapping(mapping) => match value {
                TaggedValue::Map(entries) => self.mapping(mapping, entries, path),
                _ => self.compound_mismatch(value, WireKind::Map, path),
            },
            Target::Record(record) => match value {
                TaggedValue::Map(entries) => self.record(record, entries, path),
                _ => self.compound_mismatch(value, WireKind::Map, path),
            },
            Target::Dynamic(slot) => {
                *slot = self.materialize(value, path)?;
                Ok(Outcome::Written)
            }
            Target::Unsupported(shape) => Err(DecodeError::UnsupportedShape {
                field: path.to_owned(),
                shape: shape.to_owned(),
            }),
        }
    }

    /// Pointee of an optional: like [`value`](Walk::value), except that a
    /// geo-point is decodable here.
    fn pointee(
        &mut self,
        target: Target<'_>,
        value: &TaggedValue,
        path: &str,
    ) -> Result<Outcome, DecodeError> {
        match target {
            Target::GeoPoint(slot) => match value {
                TaggedValue::GeoPoint(point) => Ok(write(slot, *point)),
                _ => self.not_accepted(value, &[WireKind::GeoPoint], path),
            },
            other => self.value(other, value, path),
        }
    }

    /// A scalar destination met a wire value it does not take. Malformed
    /// payloads of an accepted kind are an error; anything else leaves the
    /// destination as it is.
    fn not_accepted(
        &self,
        value: &TaggedValue,
        accepted: &[WireKind],
        path: &str,
    ) -> Result<Outcome, DecodeError> {
        if let TaggedValue::Malformed { kind, payload } = value {
            if accepted.contains(kind) {
                return Err(malformed_payload(*kind, payload, path));
            }
        }
        tracing::trace!(
            field = path,
            wire = ?value.kind(),
            "wire kind not accepted, leaving destination untouched"
        );
        Ok(Outcome::Untouched)
    }

    fn compound_mismatch(
        &self,
        value: &TaggedValue,
        expected: WireKind,
        path: &str,
    ) -> Result<Outcome, DecodeError> {
        if value.is_null() {
            tracing::trace!(field = path, "null wire value, leaving destination untouched");
            return Ok(Outcome::Untouched);
        }
        Err(DecodeError::TypeMismatch {
            field: path.to_owned(),
            expected: expected_name(expected).to_owned(),
        })
    }

    fn enter(&mut self, path: &str) -> Result<(), DecodeError> {
        if self.depth >= self.options.max_depth {
            return Err(DecodeError::UnsupportedShape {
                field: path.to_owned(),
                shape: format!("nesting deeper than {} levels", self.options.max_depth),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn sequence(
        &mut self,
        sequence: &mut dyn SequenceSlot,
        items: &[TaggedValue],
        path: &str,
    ) -> Result<Outcome, DecodeError> {
        if let Some(capacity) = sequence.fixed_len() {
            if items.len() > capacity {
                return Err(DecodeError::TypeMismatch {
                    field: path.to_owned(),
                    expected: format!("array of at most {capacity} elements"),
                });
            }
        }
        self.enter(path)?;
        sequence.reset(items.len());
        for (index, item) in items.iter().enumerate() {
            let item_path = index_path(path, index);
            require_record(item, &item_path, WireKind::Array)?;
            self.value(sequence.element(index), item, &item_path)?;
        }
        self.leave();
        Ok(Outcome::Written)
    }

    fn mapping(
        &mut self,
        mapping: &mut dyn MappingSlot,
        entries: &IndexMap<String, TaggedValue>,
        path: &str,
    ) -> Result<Outcome, DecodeError> {
        let key_kind = mapping.key_kind();
        if key_kind != KeyKind::String {
            return Err(DecodeError::UnsupportedShape {
                field: path.to_owned(),
                shape: format!("map with {key_kind} keys"),
            });
        }
        self.enter(path)?;
        for (key, entry) in entries {
            let entry_path = child_path(path, key);
            require_record(entry, &entry_path, WireKind::Map)?;
            mapping.insert_with(key, &mut |element| self.value(element, entry, &entry_path))?;
        }
        self.leave();
        Ok(Outcome::Written)
    }

    /// Field enumeration: declared order, exported fields only, absent wire
    /// fields left alone, first error wins.
    fn record(
        &mut self,
        record: &mut dyn Record,
        entries: &IndexMap<String, TaggedValue>,
        path: &str,
    ) -> Result<Outcome, DecodeError> {
        self.enter(path)?;
        for (index, spec) in record.fields().iter().enumerate() {
            if !spec.exported {
                continue;
            }
            let tag = FieldTag::parse(spec.tag);
            if tag.is_skipped() {
                continue;
            }
            let field_path = child_path(path, tag.name());
            let Some(entry) = entries.get(tag.name()) else {
                tracing::trace!(field = %field_path, member = spec.name, "absent on the wire");
                continue;
            };
            require_record(entry, &field_path, WireKind::Map)?;
            let outcome = self
                .value(record.field(index), entry, &field_path)
                .inspect_err(|err| {
                    tracing::trace!(field = %field_path, member = spec.name, "field failed: {err}");
                })?;
            if outcome == Outcome::Written {
                self.written.push(field_path);
            }
        }
        self.leave();
        Ok(Outcome::Written)
    }

    fn materialize(&mut self, value: &TaggedValue, path: &str) -> Result<Dynamic, DecodeError> {
        Ok(match value {
            TaggedValue::Null => Dynamic::Null,
            TaggedValue::Boolean(b) => Dynamic::Bool(*b),
            TaggedValue::Integer(text) => Dynamic::Integer(parse_int(text, path)?),
            TaggedValue::Double(f) => Dynamic::Double(*f),
            TaggedValue::Timestamp(text) => Dynamic::Timestamp(parse_timestamp(text, path)?),
            TaggedValue::String(s) | TaggedValue::Reference(s) => Dynamic::String(s.clone()),
            TaggedValue::Bytes(text) => Dynamic::Bytes(decode_bytes(text, path)?),
            TaggedValue::GeoPoint(point) => Dynamic::GeoPoint(*point),
            TaggedValue::Array(items) => {
                self.enter(path)?;
                let items = items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let item_path = index_path(path, index);
                        require_record(item, &item_path, WireKind::Array)?;
                        self.materialize(item, &item_path)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.leave();
                Dynamic::Array(items)
            }
            TaggedValue::Map(entries) => Dynamic::Map(self.materialize_map(entries, path)?),
            TaggedValue::Malformed { kind, payload } => {
                return Err(malformed_payload(*kind, payload, path));
            }
            TaggedValue::Unknown(raw) => {
                return Err(DecodeError::UnknownWireKind {
                    field: path.to_owned(),
                    raw: raw.to_string(),
                });
            }
        })
    }

    fn materialize_map(
        &mut self,
        entries: &IndexMap<String, TaggedValue>,
        path: &str,
    ) -> Result<IndexMap<String, Dynamic>, DecodeError> {
        self.enter(path)?;
        let map = entries
            .iter()
            .map(|(key, entry)| {
                let entry_path = child_path(path, key);
                require_record(entry, &entry_path, WireKind::Map)?;
                let entry = self.materialize(entry, &entry_path)?;
                Ok((key.clone(), entry))
            })
            .collect::<Result<IndexMap<_, _>, DecodeError>>()?;
        self.leave();
        Ok(map)
    }
}

/// Entries of arrays, maps and documents must be one-key JSON objects. An
/// object without a known tag passes and is judged by the destination.
fn require_record(
    value: &TaggedValue,
    path: &str,
    container: WireKind,
) -> Result<(), DecodeError> {
    match value {
        TaggedValue::Unknown(raw) if !raw.is_object() => Err(DecodeError::TypeMismatch {
            field: path.to_owned(),
            expected: expected_name(container).to_owned(),
        }),
        _ => Ok(()),
    }
}

fn write<T>(slot: &mut T, value: T) -> Outcome {
    *slot = value;
    Outcome::Written
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}.{name}")
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

fn expected_name(kind: WireKind) -> &'static str {
    match kind {
        WireKind::Null => "null",
        WireKind::Boolean => "bool",
        WireKind::Integer => "int string",
        WireKind::Double => "float64",
        WireKind::Timestamp => "timestamp string",
        WireKind::String => "string",
        WireKind::Bytes => "bytes string",
        WireKind::Reference => "reference string",
        WireKind::GeoPoint => "geoPoint map",
        WireKind::Array => "array",
        WireKind::Map => "map",
    }
}

/// Type mismatch for a recognized tag with a payload of the wrong shape.
/// Geo-points name the offending coordinate.
fn malformed_payload(kind: WireKind, payload: &Json, path: &str) -> DecodeError {
    if kind == WireKind::GeoPoint {
        if let Json::Object(point) = payload {
            let coordinate = ["latitude", "longitude"]
                .into_iter()
                .find(|name| point.get(*name).and_then(Json::as_f64).is_none());
            if let Some(coordinate) = coordinate {
                return DecodeError::TypeMismatch {
                    field: format!("{path}.{coordinate}"),
                    expected: "float64".to_owned(),
                };
            }
        }
    }
    DecodeError::TypeMismatch {
        field: path.to_owned(),
        expected: expected_name(kind).to_owned(),
    }
}

fn parse_int(text: &str, path: &str) -> Result<i64, DecodeError> {
    text.parse::<i64>()
        .map_err(|err| DecodeError::MalformedValue {
            field: path.to_owned(),
            kind: WireKind::Integer,
            reason: err.to_string(),
        })
}

fn parse_timestamp(text: &str, path: &str) -> Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|err| DecodeError::MalformedValue {
            field: path.to_owned(),
            kind: WireKind::Timestamp,
            reason: err.to_string(),
        })
}

fn decode_bytes(text: &str, path: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(text)
        .map_err(|err| DecodeError::MalformedValue {
            field: path.to_owned(),
            kind: WireKind::Bytes,
            reason: err.to_string(),
        })
}

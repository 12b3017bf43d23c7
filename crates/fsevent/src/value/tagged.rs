//! Tagged wire values.
//!
//! Every field of a document travels as a one-key JSON object whose key names
//! the value's kind, e.g. `{"integerValue": "42"}` or
//! `{"mapValue": {"fields": {...}}}`. [`TaggedValue::from_json`] turns such a
//! record into a typed variant without ever failing: payloads with the wrong
//! JSON shape become [`TaggedValue::Malformed`] and records with no known tag
//! become [`TaggedValue::Unknown`], so the decoder can report them against the
//! field that actually reaches them.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;

use super::geo::LatLng;

/// Discriminant of a [`TaggedValue`], named after its wire key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireKind {
    Null,
    Boolean,
    Integer,
    Double,
    Timestamp,
    String,
    Bytes,
    Reference,
    GeoPoint,
    Array,
    Map,
}

impl WireKind {
    /// All kinds, in the order tags are resolved when a record carries more
    /// than one of them.
    pub const ALL: [WireKind; 11] = [
        WireKind::Null,
        WireKind::Boolean,
        WireKind::Integer,
        WireKind::Double,
        WireKind::Timestamp,
        WireKind::String,
        WireKind::Bytes,
        WireKind::Reference,
        WireKind::GeoPoint,
        WireKind::Array,
        WireKind::Map,
    ];

    /// The JSON key carrying this kind on the wire.
    pub fn key(self) -> &'static str {
        match self {
            WireKind::Null => "nullValue",
            WireKind::Boolean => "booleanValue",
            WireKind::Integer => "integerValue",
            WireKind::Double => "doubleValue",
            WireKind::Timestamp => "timestampValue",
            WireKind::String => "stringValue",
            WireKind::Bytes => "bytesValue",
            WireKind::Reference => "referenceValue",
            WireKind::GeoPoint => "geoPointValue",
            WireKind::Array => "arrayValue",
            WireKind::Map => "mapValue",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One wire value.
///
/// Textual payloads (`Integer`, `Timestamp`, `Bytes`) are kept as received and
/// only parsed when decoded into a destination, so a bad leaf fails exactly
/// the decodes that reach it.
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedValue {
    Null,
    Boolean(bool),
    /// Base-10 signed integer text.
    Integer(String),
    Double(f64),
    /// RFC 3339 text with optional nanosecond fraction.
    Timestamp(String),
    String(String),
    /// Standard (padded) base64 text.
    Bytes(String),
    /// Document path; references are never resolved.
    Reference(String),
    GeoPoint(LatLng),
    Array(Vec<TaggedValue>),
    Map(IndexMap<String, TaggedValue>),
    /// A recognized tag whose payload has the wrong JSON shape.
    Malformed { kind: WireKind, payload: Json },
    /// A record carrying none of the recognized tags.
    Unknown(Json),
}

impl TaggedValue {
    /// Converts one wire record. Never fails.
    pub fn from_json(raw: &Json) -> Self {
        let Json::Object(record) = raw else {
            return TaggedValue::Unknown(raw.clone());
        };
        for kind in WireKind::ALL {
            match record.get(kind.key()) {
                // `nullValue` is the only tag whose payload is itself null.
                Some(payload) if kind == WireKind::Null || !payload.is_null() => {
                    return Self::from_payload(kind, payload);
                }
                _ => {}
            }
        }
        TaggedValue::Unknown(raw.clone())
    }

    fn from_payload(kind: WireKind, payload: &Json) -> Self {
        let converted = match (kind, payload) {
            (WireKind::Null, _) => Some(TaggedValue::Null),
            (WireKind::Boolean, Json::Bool(b)) => Some(TaggedValue::Boolean(*b)),
            (WireKind::Integer, Json::String(s)) => Some(TaggedValue::Integer(s.clone())),
            (WireKind::Double, Json::Number(n)) => n.as_f64().map(TaggedValue::Double),
            (WireKind::Double, Json::String(s)) => special_double(s).map(TaggedValue::Double),
            (WireKind::Timestamp, Json::String(s)) => Some(TaggedValue::Timestamp(s.clone())),
            (WireKind::String, Json::String(s)) => Some(TaggedValue::String(s.clone())),
            (WireKind::Bytes, Json::String(s)) => Some(TaggedValue::Bytes(s.clone())),
            (WireKind::Reference, Json::String(s)) => Some(TaggedValue::Reference(s.clone())),
            (WireKind::GeoPoint, Json::Object(point)) => {
                let latitude = point.get("latitude").and_then(Json::as_f64);
                let longitude = point.get("longitude").and_then(Json::as_f64);
                match (latitude, longitude) {
                    (Some(latitude), Some(longitude)) => Some(TaggedValue::GeoPoint(LatLng {
                        latitude,
                        longitude,
                    })),
                    _ => None,
                }
            }
            // Empty collections arrive without their inner key.
            (WireKind::Array, Json::Object(array)) => match array.get("values") {
                None | Some(Json::Null) => Some(TaggedValue::Array(Vec::new())),
                Some(Json::Array(values)) => Some(TaggedValue::Array(
                    values.iter().map(TaggedValue::from_json).collect(),
                )),
                Some(_) => None,
            },
            (WireKind::Map, Json::Object(map)) => match map.get("fields") {
                None | Some(Json::Null) => Some(TaggedValue::Map(IndexMap::new())),
                Some(Json::Object(fields)) => Some(TaggedValue::Map(
                    fields
                        .iter()
                        .map(|(key, value)| (key.clone(), TaggedValue::from_json(value)))
                        .collect(),
                )),
                Some(_) => None,
            },
            _ => None,
        };
        converted.unwrap_or_else(|| TaggedValue::Malformed {
            kind,
            payload: payload.clone(),
        })
    }

    /// The wire kind, or `None` for [`TaggedValue::Unknown`].
    pub fn kind(&self) -> Option<WireKind> {
        match self {
            TaggedValue::Null => Some(WireKind::Null),
            TaggedValue::Boolean(_) => Some(WireKind::Boolean),
            TaggedValue::Integer(_) => Some(WireKind::Integer),
            TaggedValue::Double(_) => Some(WireKind::Double),
            TaggedValue::Timestamp(_) => Some(WireKind::Timestamp),
            TaggedValue::String(_) => Some(WireKind::String),
            TaggedValue::Bytes(_) => Some(WireKind::Bytes),
            TaggedValue::Reference(_) => Some(WireKind::Reference),
            TaggedValue::GeoPoint(_) => Some(WireKind::GeoPoint),
            TaggedValue::Array(_) => Some(WireKind::Array),
            TaggedValue::Map(_) => Some(WireKind::Map),
            TaggedValue::Malformed { kind, .. } => Some(*kind),
            TaggedValue::Unknown(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TaggedValue::Null)
    }
}

fn special_double(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for TaggedValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Json::deserialize(deserializer)?;
        Ok(TaggedValue::from_json(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_tags_convert() {
        assert_eq!(
            TaggedValue::from_json(&json!({"booleanValue": true})),
            TaggedValue::Boolean(true)
        );
        assert_eq!(
            TaggedValue::from_json(&json!({"integerValue": "-12"})),
            TaggedValue::Integer("-12".into())
        );
        assert_eq!(
            TaggedValue::from_json(&json!({"doubleValue": 1.5})),
            TaggedValue::Double(1.5)
        );
        assert_eq!(
            TaggedValue::from_json(&json!({"referenceValue": "projects/p/databases/d"})),
            TaggedValue::Reference("projects/p/databases/d".into())
        );
        assert_eq!(
            TaggedValue::from_json(&json!({"nullValue": null})),
            TaggedValue::Null
        );
    }

    #[test]
    fn double_accepts_special_strings() {
        assert_eq!(
            TaggedValue::from_json(&json!({"doubleValue": "Infinity"})),
            TaggedValue::Double(f64::INFINITY)
        );
        match TaggedValue::from_json(&json!({"doubleValue": "NaN"})) {
            TaggedValue::Double(v) => assert!(v.is_nan()),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            TaggedValue::from_json(&json!({"doubleValue": "1.5"})),
            TaggedValue::Malformed {
                kind: WireKind::Double,
                ..
            }
        ));
    }

    #[test]
    fn wrong_payload_shape_is_malformed() {
        assert_eq!(
            TaggedValue::from_json(&json!({"integerValue": 3})),
            TaggedValue::Malformed {
                kind: WireKind::Integer,
                payload: json!(3)
            }
        );
        assert!(matches!(
            TaggedValue::from_json(&json!({"geoPointValue": {"latitude": 1.0}})),
            TaggedValue::Malformed {
                kind: WireKind::GeoPoint,
                ..
            }
        ));
        assert!(matches!(
            TaggedValue::from_json(&json!({"arrayValue": {"values": "nope"}})),
            TaggedValue::Malformed {
                kind: WireKind::Array,
                ..
            }
        ));
    }

    #[test]
    fn empty_collections_omit_inner_key() {
        assert_eq!(
            TaggedValue::from_json(&json!({"arrayValue": {}})),
            TaggedValue::Array(Vec::new())
        );
        assert_eq!(
            TaggedValue::from_json(&json!({"mapValue": {}})),
            TaggedValue::Map(IndexMap::new())
        );
    }

    #[test]
    fn nested_collections_convert_recursively() {
        let value = TaggedValue::from_json(&json!({
            "mapValue": {"fields": {
                "list": {"arrayValue": {"values": [{"stringValue": "a"}, {"integerValue": "1"}]}}
            }}
        }));
        let TaggedValue::Map(fields) = value else {
            panic!("expected map");
        };
        assert_eq!(
            fields["list"],
            TaggedValue::Array(vec![
                TaggedValue::String("a".into()),
                TaggedValue::Integer("1".into()),
            ])
        );
    }

    #[test]
    fn untagged_records_are_unknown() {
        assert_eq!(
            TaggedValue::from_json(&json!({"decimalValue": "1"})),
            TaggedValue::Unknown(json!({"decimalValue": "1"}))
        );
        assert_eq!(
            TaggedValue::from_json(&json!("bare")),
            TaggedValue::Unknown(json!("bare"))
        );
        // A null payload means the tag is not set.
        assert_eq!(
            TaggedValue::from_json(&json!({"booleanValue": null})),
            TaggedValue::Unknown(json!({"booleanValue": null}))
        );
    }

    #[test]
    fn tag_priority_follows_kind_order() {
        assert_eq!(
            TaggedValue::from_json(&json!({"referenceValue": "r", "stringValue": "s"})),
            TaggedValue::String("s".into())
        );
    }

    #[test]
    fn wire_kind_keys_roundtrip() {
        for kind in WireKind::ALL {
            assert_eq!(WireKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(WireKind::from_key("decimalValue"), None);
        assert_eq!(WireKind::Bytes.to_string(), "bytesValue");
    }
}

//! Error types for decoding value trees into destinations.

use crate::value::WireKind;

/// Reasons a decode call stops.
///
/// Every variant except `InvalidDestination` names the wire field path it
/// failed on, e.g. `structmap.keyint` or `arrstr[1]`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// The top-level destination is neither a record nor a string-keyed map.
    #[error("fsevent: invalid destination: {shape} cannot hold a document")]
    InvalidDestination { shape: &'static str },
    /// The wire kind is present but cannot populate the destination.
    #[error("fsevent: {field} is not {expected}")]
    TypeMismatch { field: String, expected: String },
    /// The wire kind matches but its content does not parse.
    #[error("fsevent: failed to parse {kind} on {field}: {reason}")]
    MalformedValue {
        field: String,
        kind: WireKind,
        reason: String,
    },
    /// The destination has no decoding rule.
    #[error("fsevent: {field}: {shape} is not supported")]
    UnsupportedShape { field: String, shape: String },
    /// The wire record carries none of the recognized tags.
    #[error("fsevent: {field}: unknown value type {raw}")]
    UnknownWireKind { field: String, raw: String },
}

impl DecodeError {
    /// The offending wire field path; empty for `InvalidDestination`.
    pub fn field(&self) -> &str {
        match self {
            DecodeError::InvalidDestination { .. } => "",
            DecodeError::TypeMismatch { field, .. }
            | DecodeError::MalformedValue { field, .. }
            | DecodeError::UnsupportedShape { field, .. }
            | DecodeError::UnknownWireKind { field, .. } => field,
        }
    }
}

/// A failed decode together with the fields written before it stopped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error} ({} field(s) written before the failure)", written.len())]
pub struct PartialDecode {
    pub error: DecodeError,
    /// Wire paths of the record fields fully written, in write order.
    pub written: Vec<String>,
}

impl PartialDecode {
    pub fn into_error(self) -> DecodeError {
        self.error
    }
}

/// Outcome of a successful tracked decode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    written: Vec<String>,
}

impl DecodeReport {
    pub(crate) fn new(written: Vec<String>) -> Self {
        Self { written }
    }

    /// Wire paths of the record fields written, in write order.
    pub fn written(&self) -> &[String] {
        &self.written
    }

    pub fn is_written(&self, path: &str) -> bool {
        self.written.iter().any(|p| p == path)
    }
}

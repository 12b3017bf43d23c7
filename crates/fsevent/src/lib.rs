//! Typed decoding and classification of document database change events.
//!
//! A change event carries the document before and after the change plus the
//! paths of the fields an update touched. Document fields travel as tagged
//! values (`{"integerValue": "42"}`, `{"mapValue": {"fields": {...}}}`, ...);
//! this crate parses them into a [`ValueTree`] and decodes that tree into any
//! destination implementing [`Decode`], usually a struct deriving it:
//!
//! ```
//! use fsevent::{Decode, Event, EventKind};
//!
//! #[derive(Debug, Default, Decode)]
//! pub struct User {
//!     #[fsevent(tag = "name")]
//!     pub name: String,
//!     pub age: Option<i64>,
//! }
//!
//! let event = Event::from_json_str(r#"{
//!     "value": {
//!         "name": "projects/p/databases/(default)/documents/users/alice",
//!         "fields": {
//!             "name": {"stringValue": "Alice"},
//!             "age": {"integerValue": "30"}
//!         }
//!     }
//! }"#)?;
//!
//! assert_eq!(event.kind(), EventKind::Created);
//! let mut user = User::default();
//! event.data_to(&mut user)?;
//! assert_eq!(user.name, "Alice");
//! assert_eq!(user.age, Some(30));
//! # Ok::<(), fsevent::Error>(())
//! ```

extern crate self as fsevent;

pub mod decode;
mod error;
mod event;
pub mod value;

pub use decode::{
    decode, Decode, DecodeError, DecodeReport, Decoder, DecoderOptions, Dynamic, FieldSpec,
    FieldTag, Fill, KeyKind, MapKey, MappingSlot, Modifier, OptionalSlot, Outcome, PartialDecode,
    Record, SequenceSlot, Target,
};
pub use error::{Error, Result};
pub use event::{classify, Event, EventKind, UpdateMask};
pub use value::{LatLng, TaggedValue, ValueTree, WireKind};

/// Derives [`Decode`] and [`Record`] for a struct with named fields.
///
/// Each field decodes from the wire field named by its `#[fsevent(tag = "...")]`
/// attribute, or by its identifier when untagged. Only `pub` fields are
/// populated; `#[fsevent(skip)]` or a tag of `"-"` opts a field out.
#[cfg(feature = "derive")]
pub use fsevent_derive::Decode;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #[test]
    fn version_is_set() {
        assert_eq!(super::version(), "0.1.0");
    }
}

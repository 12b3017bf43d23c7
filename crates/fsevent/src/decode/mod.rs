//! Generic decoding of value trees into caller-defined destinations.

mod decoder;
mod dynamic;
mod error;
mod options;
mod tag;
mod target;

pub use decoder::{decode, Decoder};
pub use dynamic::Dynamic;
pub use error::{DecodeError, DecodeReport, PartialDecode};
pub use options::DecoderOptions;
pub use tag::{FieldTag, Modifier};
pub use target::{
    Decode, FieldSpec, Fill, KeyKind, MapKey, MappingSlot, OptionalSlot, Outcome, Record,
    SequenceSlot, Target,
};

//! In-memory model of the document value wire format.

mod geo;
mod tagged;
mod tree;

pub use geo::LatLng;
pub use tagged::{TaggedValue, WireKind};
pub use tree::ValueTree;

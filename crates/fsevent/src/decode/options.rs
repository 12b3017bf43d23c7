/// Knobs for [`Decoder`](super::Decoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Let `integerValue` populate `f64` destinations when no `doubleValue`
    /// is present.
    pub widen_integers: bool,
    /// Deepest array/map nesting followed before giving up.
    pub max_depth: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            widen_integers: true,
            max_depth: 64,
        }
    }
}

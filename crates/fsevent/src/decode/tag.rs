//! Field tags: `"wireName,modifier,..."`.

/// Behavior modifier following the wire name in a field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier<'a> {
    /// The upstream system fills the field at write time. Decoding is
    /// unaffected.
    ServerTimestamp,
    /// Encode-side hint; accepted and ignored when decoding.
    OmitEmpty,
    Other(&'a str),
}

impl<'a> Modifier<'a> {
    fn parse(segment: &'a str) -> Self {
        match segment {
            "serverTimestamp" => Modifier::ServerTimestamp,
            "omitempty" => Modifier::OmitEmpty,
            other => Modifier::Other(other),
        }
    }
}

/// A parsed field tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTag<'a> {
    name: &'a str,
    modifiers: Vec<Modifier<'a>>,
}

impl<'a> FieldTag<'a> {
    pub fn parse(tag: &'a str) -> Self {
        let mut segments = tag.split(',');
        let name = segments.next().unwrap_or_default().trim();
        let modifiers = segments
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(Modifier::parse)
            .collect();
        Self { name, modifiers }
    }

    /// The wire field name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn modifiers(&self) -> &[Modifier<'a>] {
        &self.modifiers
    }

    pub fn has(&self, modifier: Modifier<'_>) -> bool {
        self.modifiers.iter().any(|m| *m == modifier)
    }

    pub fn is_server_timestamp(&self) -> bool {
        self.has(Modifier::ServerTimestamp)
    }

    /// `-` opts a field out of decoding.
    pub fn is_skipped(&self) -> bool {
        self.name == "-"
    }
}

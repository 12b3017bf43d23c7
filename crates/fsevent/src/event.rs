//! Change events and their classification.

use std::fmt;

use serde::Deserialize;

use crate::decode::{Decode, DecodeError};
use crate::value::ValueTree;

/// Paths of the fields an update touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMask {
    #[serde(default)]
    pub field_paths: Vec<String>,
}

/// Payload of a document change event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    old_value: Option<ValueTree>,
    #[serde(default)]
    value: Option<ValueTree>,
    #[serde(default)]
    update_mask: Option<UpdateMask>,
}

/// What a change event did to its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

impl EventKind {
    /// Upstream label: `Create`, `Update` or `Delete`.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "Create",
            EventKind::Updated => "Update",
            EventKind::Deleted => "Delete",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    pub fn new(
        previous: Option<ValueTree>,
        current: Option<ValueTree>,
        changed_fields: Vec<String>,
    ) -> Self {
        Self {
            old_value: previous,
            value: current,
            update_mask: Some(UpdateMask {
                field_paths: changed_fields,
            }),
        }
    }

    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_slice(json: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }

    /// Document before the change; absent on creation.
    pub fn previous(&self) -> Option<&ValueTree> {
        self.old_value.as_ref()
    }

    /// Document after the change; absent on deletion.
    pub fn current(&self) -> Option<&ValueTree> {
        self.value.as_ref()
    }

    /// Field paths touched by an update, in wire order.
    pub fn changed_fields(&self) -> &[String] {
        self.update_mask
            .as_ref()
            .map(|mask| mask.field_paths.as_slice())
            .unwrap_or_default()
    }

    pub fn is_changed(&self, field_path: &str) -> bool {
        self.changed_fields().iter().any(|p| p == field_path)
    }

    pub fn kind(&self) -> EventKind {
        classify(self)
    }

    /// Decodes the current document into `dest`. Without a current document
    /// `dest` is left untouched.
    pub fn data_to<D>(&self, dest: &mut D) -> Result<(), DecodeError>
    where
        D: Decode + ?Sized,
    {
        match self.current() {
            Some(tree) => tree.data_to(dest),
            None => Ok(()),
        }
    }

    /// Decodes the previous document into `dest`. Without a previous document
    /// `dest` is left untouched.
    pub fn old_data_to<D>(&self, dest: &mut D) -> Result<(), DecodeError>
    where
        D: Decode + ?Sized,
    {
        match self.previous() {
            Some(tree) => tree.data_to(dest),
            None => Ok(()),
        }
    }
}

/// Classifies an event by which of its parts are present.
///
/// A non-empty update mask means `Updated`; otherwise a current document with
/// a name means `Created`; anything else is `Deleted`. Field contents are
/// never inspected.
pub fn classify(event: &Event) -> EventKind {
    if !event.changed_fields().is_empty() {
        return EventKind::Updated;
    }
    match event.current() {
        Some(tree) if !tree.name.is_empty() => EventKind::Created,
        _ => EventKind::Deleted,
    }
}

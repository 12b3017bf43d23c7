use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use super::tagged::TaggedValue;
use crate::decode::{Decode, DecodeError, Decoder};

/// A document snapshot: its path, timestamps and tagged fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueTree {
    /// Fully-qualified document path,
    /// `projects/{project}/databases/{database}/documents/{path}`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fields: IndexMap<String, TaggedValue>,
}

impl ValueTree {
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Last segment of the document path, empty when the tree has no name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    pub fn get(&self, field: &str) -> Option<&TaggedValue> {
        self.fields.get(field)
    }

    /// Populates `dest` from the document fields with default options.
    ///
    /// Fields decoded before a failure stay written; decode into a fresh
    /// destination (see [`ValueTree::decode_new`]) when that matters.
    pub fn data_to<D>(&self, dest: &mut D) -> Result<(), DecodeError>
    where
        D: Decode + ?Sized,
    {
        Decoder::new().decode(self, dest)
    }

    /// Decodes into a freshly constructed `T`, returned only on success.
    pub fn decode_new<T>(&self) -> Result<T, DecodeError>
    where
        T: Decode + Default,
    {
        let mut dest = T::default();
        self.data_to(&mut dest)?;
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_document_envelope() {
        let tree = ValueTree::from_json_str(
            r#"{
                "name": "projects/p/databases/(default)/documents/users/alice",
                "createTime": "2020-01-02T03:04:05.123456Z",
                "updateTime": "2020-01-02T03:04:06Z",
                "fields": {"age": {"integerValue": "30"}}
            }"#,
        )
        .unwrap();
        assert_eq!(tree.id(), "alice");
        assert_eq!(
            tree.create_time,
            Some(
                Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()
                    + chrono::Duration::microseconds(123_456)
            )
        );
        assert_eq!(
            tree.update_time,
            Some(Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 6).unwrap())
        );
        assert_eq!(tree.get("age"), Some(&TaggedValue::Integer("30".into())));
        assert_eq!(tree.get("missing"), None);
    }

    #[test]
    fn missing_envelope_members_default() {
        let tree = ValueTree::from_json_str("{}").unwrap();
        assert_eq!(tree, ValueTree::default());
        assert_eq!(tree.id(), "");
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = ValueTree::from_json_str("{\"fields\": [}").unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }
}

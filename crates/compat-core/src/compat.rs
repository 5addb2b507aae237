//! Compat record types
//!
//! Typed view of one `__compat` record from browser-compat-data. Only the
//! fields the overlay engine reads or writes are modelled; everything else
//! is carried through untouched in `extra`/`rest`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A field that is either a bare value or a list of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// First element; for support statements this is the latest entry.
    pub fn first(&self) -> Option<&T> {
        match self {
            Self::One(v) => Some(v),
            Self::Many(vs) => vs.first(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(vs) => vs,
        }
    }
}

/// `version_added` / `version_removed`: a version string or a boolean.
/// `null` is represented by the surrounding `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionValue {
    Flag(bool),
    Version(String),
}

impl VersionValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Flag(b) => *b,
            Self::Version(v) => !v.is_empty(),
        }
    }
}

impl From<&str> for VersionValue {
    fn from(v: &str) -> Self {
        Self::Version(v.to_string())
    }
}

/// Ordered notes, most important first. Stored as a list; serialized as a
/// bare string when there is exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notes(Vec<String>);

impl Notes {
    pub fn new(notes: Vec<String>) -> Self {
        Self(notes)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Put `notes` ahead of the existing ones, keeping their relative order.
    pub fn prepend(&mut self, notes: Vec<String>) {
        let existing = std::mem::replace(&mut self.0, notes);
        self.0.extend(existing);
    }
}

impl Serialize for Notes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => serializer.serialize_str(single),
            all => all.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Notes {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<OneOrMany<String>>::deserialize(deserializer)
            .map(|notes| Self(notes.map(OneOrMany::into_vec).unwrap_or_default()))
    }
}

/// One support statement for one browser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    #[serde(default)]
    pub version_added: Option<VersionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_removed: Option<VersionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_implementation: Option<bool>,
    #[serde(default, skip_serializing_if = "Notes::is_empty")]
    pub notes: Notes,
    /// prefix, alternative_name, flags, impl_url, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionEntry {
    pub fn added(version: impl Into<VersionValue>) -> Self {
        Self {
            version_added: Some(version.into()),
            ..Default::default()
        }
    }

    /// Supported and not removed since.
    pub fn is_supported(&self) -> bool {
        let added = self.version_added.as_ref().is_some_and(VersionValue::is_truthy);
        let removed = self
            .version_removed
            .as_ref()
            .is_some_and(VersionValue::is_truthy);
        added && !removed
    }
}

impl From<bool> for VersionValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

/// The `__compat` record of one feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatRecord {
    #[serde(default)]
    pub support: BTreeMap<String, OneOrMany<VersionEntry>>,
    /// description, mdn_url, spec_url, status, tags, ...
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl CompatRecord {
    /// Latest native entry for `browser_id`.
    pub fn latest(&self, browser_id: &str) -> Option<&VersionEntry> {
        self.support.get(browser_id).and_then(OneOrMany::first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_notes_serialize_single_as_string() {
        let entry = VersionEntry {
            notes: Notes::new(vec!["only".into()]),
            ..VersionEntry::added("10")
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"version_added": "10", "notes": "only"})
        );
    }

    #[test]
    fn test_notes_serialize_many_as_list() {
        let mut notes = Notes::new(vec!["b".into()]);
        notes.prepend(vec!["a".into()]);
        let entry = VersionEntry {
            notes,
            ..VersionEntry::added("10")
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"version_added": "10", "notes": ["a", "b"]})
        );
    }

    #[test]
    fn test_entry_keeps_unmodelled_fields() {
        let raw = json!({
            "version_added": "57",
            "prefix": "webkit",
            "flags": [{"type": "preference", "name": "x"}],
            "notes": ["one", "two"]
        });
        let entry: VersionEntry = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(entry.notes.as_slice(), ["one", "two"]);
        assert_eq!(entry.extra.get("prefix"), Some(&json!("webkit")));
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn test_null_version_added_round_trips() {
        let entry: VersionEntry = serde_json::from_value(json!({"version_added": null})).unwrap();
        assert_eq!(entry.version_added, None);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"version_added": null})
        );
    }

    #[test]
    fn test_is_supported() {
        assert!(VersionEntry::added("10").is_supported());
        assert!(VersionEntry::added(true).is_supported());
        assert!(!VersionEntry::added(false).is_supported());
        assert!(!VersionEntry::default().is_supported());

        let removed = VersionEntry {
            version_removed: Some("20".into()),
            ..VersionEntry::added("10")
        };
        assert!(!removed.is_supported());
    }

    #[test]
    fn test_record_latest_uses_first_entry() {
        let record: CompatRecord = serde_json::from_value(json!({
            "support": {
                "chrome": [{"version_added": "80"}, {"version_added": "60", "prefix": "webkit"}],
                "firefox": {"version_added": false}
            },
            "status": {"experimental": false}
        }))
        .unwrap();
        assert_eq!(record.latest("chrome"), Some(&VersionEntry::added("80")));
        assert_eq!(record.latest("firefox"), Some(&VersionEntry::added(false)));
        assert_eq!(record.latest("safari"), None);
        assert!(record.rest.contains_key("status"));
    }
}

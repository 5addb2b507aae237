//! Overlay Engine
//!
//! Derives the synthetic browser's support entry from the native entry of
//! each real browser and the authored annotation for the feature.
//!
//! | native    | annotation                                   | synthetic entry                      |
//! |-----------|----------------------------------------------|--------------------------------------|
//! | no        | any                                          | `version_added: false`               |
//! | yes       | unknown                                      | `version_added: null` + note         |
//! | yes       | todo, never                                  | `version_added: false` + note        |
//! | yes       | tested, clean, follower working and clean    | native entry unchanged               |
//! | yes       | tested with caveats, partial                 | native + `partial_implementation`    |
//! | yes       | expected                                     | native + `partial_implementation`    |
//!
//! Notes are composed free-text first, then the in-control follower note,
//! then the primary status/limitation note, each prepended. The final list
//! therefore reads primary, follower, free-text, then any native notes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compat::{CompatRecord, Notes, OneOrMany, VersionEntry, VersionValue};
use crate::feature_tree::FeatureTree;
use crate::support::Support;

const FOLLOWER_LABEL: &str = "In-control follower";

/// Authored support annotation for one feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub id: String,
    pub support: Support,
    pub limitations: Vec<String>,
    /// Defaults to `support` when absent.
    pub icf_support: Option<Support>,
    pub icf_limitations: Vec<String>,
    /// Free-text body of the annotation file.
    pub note: Option<String>,
}

impl Annotation {
    pub fn new(id: impl Into<String>, support: Support) -> Self {
        Self {
            id: id.into(),
            support,
            limitations: Vec::new(),
            icf_support: None,
            icf_limitations: Vec::new(),
            note: None,
        }
    }

    pub fn icf_support(&self) -> Support {
        self.icf_support.unwrap_or(self.support)
    }

    /// The follower's experience differs from the controller's.
    pub fn has_follower_difference(&self) -> bool {
        self.icf_support() != self.support || !self.icf_limitations.is_empty()
    }
}

/// Which row of the precedence table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not supported natively; nothing to overlay
    NativeUnsupported,
    /// Support under the synthetic browser is unknown
    Unknown,
    /// Not implemented (todo) or not implementable (never)
    NotImplemented,
    /// Works exactly like the native browser
    Unchanged,
    /// Works with caveats
    Partial,
    /// Expected to work, not tested
    Expected,
}

/// The precedence table as a pure function of its inputs.
pub fn classify(
    native_supported: bool,
    support: Support,
    has_limitations: bool,
    icf_support: Support,
    has_icf_limitations: bool,
) -> Outcome {
    if !native_supported {
        return Outcome::NativeUnsupported;
    }
    match support {
        Support::Unknown => Outcome::Unknown,
        Support::Todo | Support::Never => Outcome::NotImplemented,
        Support::Expected => Outcome::Expected,
        Support::Partial => Outcome::Partial,
        Support::Tested => {
            if !has_limitations && icf_support.is_working() && !has_icf_limitations {
                Outcome::Unchanged
            } else {
                Outcome::Partial
            }
        }
    }
}

/// The synthetic browser: column id prefix and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticBrowser {
    pub id_prefix: String,
    pub name: String,
}

impl Default for SyntheticBrowser {
    fn default() -> Self {
        Self {
            id_prefix: "surfly".into(),
            name: "Surfly".into(),
        }
    }
}

impl SyntheticBrowser {
    /// `chrome` -> `surfly_chrome`
    pub fn column_id(&self, browser_id: &str) -> String {
        format!("{}_{}", self.id_prefix, browser_id)
    }

    pub fn is_column(&self, browser_id: &str) -> bool {
        browser_id
            .strip_prefix(self.id_prefix.as_str())
            .is_some_and(|rest| rest.starts_with('_'))
    }

    /// `Chrome` -> `Surfly on Chrome`
    pub fn display_name(&self, browser_name: &str) -> String {
        format!("{} on {}", self.name, browser_name)
    }
}

/// Counters for one overlay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayStats {
    pub annotated: usize,
    pub columns: usize,
    pub skipped: usize,
}

pub struct OverlayEngine {
    synthetic: SyntheticBrowser,
    browsers: Vec<String>,
}

impl OverlayEngine {
    /// `browsers` is the allow-list of real browsers that get a synthetic column.
    pub fn new(synthetic: SyntheticBrowser, browsers: Vec<String>) -> Self {
        Self {
            synthetic,
            browsers,
        }
    }

    pub fn synthetic(&self) -> &SyntheticBrowser {
        &self.synthetic
    }

    pub fn browsers(&self) -> &[String] {
        &self.browsers
    }

    /// Notes for `outcome`, most important first.
    fn compose_notes(&self, outcome: Outcome, annotation: &Annotation) -> Notes {
        let product = self.synthetic.name.as_str();
        let mut notes = Notes::default();

        let free_text = annotation
            .note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty());
        notes.prepend(free_text.map(str::to_string).into_iter().collect());

        if matches!(outcome, Outcome::NativeUnsupported | Outcome::Unchanged) {
            return notes;
        }

        if annotation.has_follower_difference() {
            let differs = annotation.icf_support() != annotation.support;
            let status = differs.then(|| annotation.icf_support().status_note(product));
            let follower = status
                .into_iter()
                .chain(annotation.icf_limitations.iter().cloned())
                .map(|note| format!("{FOLLOWER_LABEL}: {note}"))
                .collect();
            notes.prepend(follower);
        }

        let primary = match outcome {
            Outcome::Unknown | Outcome::NotImplemented => {
                vec![annotation.support.status_note(product)]
            }
            Outcome::Expected => std::iter::once(annotation.support.status_note(product))
                .chain(annotation.limitations.iter().cloned())
                .collect(),
            Outcome::Partial if !annotation.limitations.is_empty() => {
                annotation.limitations.clone()
            }
            Outcome::Partial if annotation.support == Support::Partial => {
                vec![annotation.support.status_note(product)]
            }
            _ => Vec::new(),
        };
        notes.prepend(primary);
        notes
    }

    /// Synthetic entry for one real browser's latest native entry.
    pub fn derive_entry(&self, native: &VersionEntry, annotation: &Annotation) -> VersionEntry {
        let outcome = classify(
            native.is_supported(),
            annotation.support,
            !annotation.limitations.is_empty(),
            annotation.icf_support(),
            !annotation.icf_limitations.is_empty(),
        );
        let notes = self.compose_notes(outcome, annotation);

        match outcome {
            Outcome::NativeUnsupported => VersionEntry::added(false),
            Outcome::Unknown => VersionEntry {
                version_added: None,
                notes,
                ..Default::default()
            },
            Outcome::NotImplemented => VersionEntry {
                version_added: Some(VersionValue::Flag(false)),
                notes,
                ..Default::default()
            },
            Outcome::Unchanged => {
                let mut entry = native.clone();
                entry.notes.prepend(notes.into_vec());
                entry
            }
            Outcome::Partial | Outcome::Expected => {
                let mut entry = native.clone();
                entry.partial_implementation = Some(true);
                entry.notes.prepend(notes.into_vec());
                entry
            }
        }
    }

    /// Add a synthetic column next to every allow-listed browser present in
    /// the record. Returns the number of columns added. Ids that are already
    /// synthetic columns never get a column of their own.
    pub fn apply(&self, record: &mut CompatRecord, annotation: &Annotation) -> usize {
        let derived: Vec<(String, VersionEntry)> = self
            .browsers
            .iter()
            .filter(|browser_id| !self.synthetic.is_column(browser_id))
            .filter_map(|browser_id| {
                let native = record.latest(browser_id)?;
                Some((
                    self.synthetic.column_id(browser_id),
                    self.derive_entry(native, annotation),
                ))
            })
            .collect();

        let added = derived.len();
        for (column, entry) in derived {
            record.support.insert(column, OneOrMany::One(entry));
        }
        added
    }

    /// Overlay every annotation onto the feature index in place. Annotations
    /// for features absent upstream are skipped.
    pub fn apply_all(
        &self,
        features: &mut FeatureTree<CompatRecord>,
        annotations: &[Annotation],
    ) -> OverlayStats {
        let mut stats = OverlayStats::default();
        for annotation in annotations {
            match features.get_mut(&annotation.id) {
                Some(record) => {
                    stats.columns += self.apply(record, annotation);
                    stats.annotated += 1;
                }
                None => {
                    debug!(feature = %annotation.id, "annotation has no upstream feature, skipping");
                    stats.skipped += 1;
                }
            }
        }
        stats
    }
}

/// Support tree for overlay tables: `base` (every upstream feature) with
/// each annotation's support laid over it. Annotations for ids that are
/// not concrete features in `base` are ignored.
pub fn support_tree(mut base: FeatureTree<Support>, annotations: &[Annotation]) -> FeatureTree<Support> {
    for annotation in annotations {
        if let Some(slot) = base.get_mut(&annotation.id) {
            *slot = annotation.support;
        }
    }
    base
}

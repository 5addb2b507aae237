//! Sparse support tables
//!
//! The documentation site receives, per page, one table per compat table on
//! that page. Unknown support is the default, so it is trimmed wherever it
//! carries no information:
//!
//! - a table's trailing `UNKNOWN` rows are dropped; an empty table becomes
//!   the scalar `UNKNOWN`
//! - a page's trailing `UNKNOWN` tables are dropped; a page with nothing
//!   left is omitted
//!
//! Re-trimming trimmed data is a no-op.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::error::{CompatError, Result};
use crate::feature_tree::FeatureTree;
use crate::support::Support;

/// Drop trailing `UNKNOWN` entries.
pub fn unpad_right(rows: &[Support]) -> &[Support] {
    let keep = rows
        .iter()
        .rposition(|s| *s != Support::Unknown)
        .map_or(0, |i| i + 1);
    &rows[..keep]
}

/// One compat table: either uniformly one level, or one level per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SupportTable {
    Uniform(Support),
    Rows(Vec<Support>),
}

impl SupportTable {
    pub fn from_rows(rows: &[Support]) -> Self {
        match unpad_right(rows) {
            [] => Self::Uniform(Support::Unknown),
            rows => Self::Rows(rows.to_vec()),
        }
    }

    pub fn trimmed(self) -> Self {
        match self {
            Self::Rows(rows) => Self::from_rows(&rows),
            uniform => uniform,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Uniform(Support::Unknown))
    }
}

/// Rows of the table for `feature_id`: the feature itself, then each
/// value-bearing descendant. Grouping nodes are not tables.
pub fn feature_rows(tree: &FeatureTree<Support>, feature_id: &str) -> Result<Vec<Support>> {
    let own = tree
        .get(feature_id)?
        .ok_or_else(|| CompatError::NotFound(feature_id.to_string()))?;
    let rows = std::iter::once(*own)
        .chain(tree.descendant_entries(feature_id)?.map(|(_, s)| *s))
        .collect();
    Ok(rows)
}

/// Trim a page's tables; `None` when the page would carry no information.
pub fn trim_page(mut tables: Vec<SupportTable>) -> Option<Vec<SupportTable>> {
    tables = tables.into_iter().map(SupportTable::trimmed).collect();
    while tables.last().is_some_and(SupportTable::is_unknown) {
        tables.pop();
    }
    (!tables.is_empty()).then_some(tables)
}

/// A documentation page and the compat tables it renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub slug: String,
    pub features: Vec<String>,
}

/// Page slug -> tables, in page order. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayMap {
    pages: Vec<(String, Vec<SupportTable>)>,
}

impl OverlayMap {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, slug: &str) -> Option<&[SupportTable]> {
        self.pages
            .iter()
            .find(|(s, _)| s == slug)
            .map(|(_, t)| t.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SupportTable])> {
        self.pages.iter().map(|(s, t)| (s.as_str(), t.as_slice()))
    }
}

impl Serialize for OverlayMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pages.len()))?;
        for (slug, tables) in &self.pages {
            map.serialize_entry(slug, tables)?;
        }
        map.end()
    }
}

/// Build the overlay mapping. Tables referencing an unknown or grouping id
/// are skipped; pages left without information are omitted.
pub fn build_overlay<I>(pages: I, tree: &FeatureTree<Support>) -> OverlayMap
where
    I: IntoIterator<Item = Page>,
{
    let mut overlay = OverlayMap::default();
    for page in pages {
        let tables: Vec<SupportTable> = page
            .features
            .iter()
            .filter_map(|feature_id| match feature_rows(tree, feature_id) {
                Ok(rows) => Some(SupportTable::from_rows(&rows)),
                Err(_) => {
                    debug!(page = %page.slug, feature = %feature_id, "unresolvable compat table, skipping");
                    None
                }
            })
            .collect();

        if let Some(tables) = trim_page(tables) {
            overlay.pages.push((page.slug, tables));
        }
    }
    overlay
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use crate::support::Support::*;

    fn tree(ids: &[(&str, Support)]) -> FeatureTree<Support> {
        ids.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn page(slug: &str, features: &[&str]) -> Page {
        Page {
            slug: slug.into(),
            features: features.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_unpad_right() {
        assert_eq!(unpad_right(&[Unknown, Unknown]), &[] as &[Support]);
        assert_eq!(unpad_right(&[Tested, Unknown]), &[Tested]);
        assert_eq!(unpad_right(&[Unknown, Tested, Unknown]), &[Unknown, Tested]);
        assert_eq!(unpad_right(&[]), &[] as &[Support]);
    }

    #[test]
    fn test_empty_table_collapses_to_unknown() {
        assert_eq!(
            SupportTable::from_rows(&[Unknown, Unknown]),
            SupportTable::Uniform(Unknown)
        );
        assert_eq!(
            SupportTable::from_rows(&[Never, Unknown]),
            SupportTable::Rows(vec![Never])
        );
    }

    #[test]
    fn test_table_serialization() {
        assert_eq!(
            serde_json::to_string(&SupportTable::Uniform(Unknown)).unwrap(),
            "0"
        );
        assert_eq!(
            serde_json::to_string(&SupportTable::Rows(vec![Tested, Unknown, Never])).unwrap(),
            "[1,0,5]"
        );
    }

    #[test]
    fn test_feature_rows_include_descendants_in_order() {
        let t = tree(&[("api.Foo", Tested), ("api.Foo.bar", Unknown), ("api.Foo.baz", Never)]);
        assert_eq!(feature_rows(&t, "api.Foo").unwrap(), vec![Tested, Unknown, Never]);
    }

    #[test]
    fn test_feature_rows_reject_grouping_node() {
        let t = tree(&[("api.Foo", Tested)]);
        assert!(feature_rows(&t, "api").is_err());
        assert!(feature_rows(&t, "api.Missing").is_err());
    }

    #[test]
    fn test_trim_page_drops_trailing_unknown_tables() {
        let tables = vec![
            SupportTable::Rows(vec![Tested]),
            SupportTable::Uniform(Unknown),
            SupportTable::Rows(vec![Unknown, Unknown]),
        ];
        assert_eq!(trim_page(tables), Some(vec![SupportTable::Rows(vec![Tested])]));
    }

    #[test]
    fn test_trim_page_keeps_inner_unknown_tables() {
        let tables = vec![SupportTable::Uniform(Unknown), SupportTable::Rows(vec![Partial])];
        assert_eq!(trim_page(tables.clone()), Some(tables));
    }

    #[test]
    fn test_all_unknown_page_is_omitted() {
        let t = tree(&[("api.Foo", Unknown), ("api.Bar", Unknown), ("api.Baz", Tested)]);
        let overlay = build_overlay(
            vec![
                page("Web/API/Foo", &["api.Foo", "api.Bar"]),
                page("Web/API/Baz", &["api.Baz"]),
            ],
            &t,
        );
        assert_eq!(overlay.len(), 1);
        assert!(overlay.get("Web/API/Foo").is_none());
        assert_eq!(
            overlay.get("Web/API/Baz"),
            Some(&[SupportTable::Rows(vec![Tested])][..])
        );
    }

    #[test]
    fn test_unresolvable_tables_are_skipped() {
        let t = tree(&[("api.Foo", Partial)]);
        let overlay = build_overlay(vec![page("Web/API/Foo", &["api.Nope", "api", "api.Foo"])], &t);
        assert_eq!(
            overlay.get("Web/API/Foo"),
            Some(&[SupportTable::Rows(vec![Partial])][..])
        );
    }

    #[test]
    fn test_overlay_serializes_in_page_order() {
        let t = tree(&[("b", Tested), ("a", Never)]);
        let overlay = build_overlay(vec![page("z", &["b"]), page("y", &["a", "b"])], &t);
        assert_eq!(serde_json::to_string(&overlay).unwrap(), r#"{"z":[[1]],"y":[[5],[1]]}"#);
    }

    fn support_strategy() -> impl Strategy<Value = Support> {
        (0u8..6).prop_map(|v| Support::from_u8(v).unwrap())
    }

    proptest! {
        #[test]
        fn prop_unpad_right_idempotent(rows in prop::collection::vec(support_strategy(), 0..12)) {
            let once = unpad_right(&rows);
            prop_assert_eq!(unpad_right(once), once);
            prop_assert!(once.last() != Some(&Unknown));
        }

        #[test]
        fn prop_trim_page_idempotent(pages in prop::collection::vec(prop::collection::vec(support_strategy(), 0..5), 0..5)) {
            let tables: Vec<SupportTable> = pages.iter().map(|rows| SupportTable::Rows(rows.clone())).collect();
            let once = trim_page(tables);
            let twice = once.clone().and_then(trim_page);
            prop_assert_eq!(once, twice);
        }
    }
}

//! Layout reconciliation
//!
//! Compares the features known upstream with the annotation files on disk.
//! Upstream features under a scaffold root without an annotation get a stub
//! at their canonical layout path; annotations whose feature disappeared
//! upstream are deleted. Planning is pure; applying the plan is up to the
//! annotation store.

use std::collections::BTreeMap;

use crate::feature_tree::{FeatureTree, LayoutEntry};

/// What a reconcile run would do. `L` is the store's location type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan<L> {
    /// Missing annotations, in upstream layout order.
    pub create: Vec<LayoutEntry>,
    /// Orphaned annotations and where they live, in id order.
    pub delete: Vec<(String, L)>,
}

impl<L> ReconcilePlan<L> {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }
}

/// `id` is `root` or lies below it. An empty root list admits everything.
pub fn under_roots(id: &str, roots: &[String]) -> bool {
    roots.is_empty()
        || roots.iter().any(|root| {
            id == root
                || id
                    .strip_prefix(root.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
}

pub fn plan<T, L: Clone>(
    upstream: &FeatureTree<T>,
    roots: &[String],
    existing: &BTreeMap<String, L>,
) -> ReconcilePlan<L> {
    let create = upstream
        .full_layout()
        .filter(|entry| under_roots(&entry.id, roots) && !existing.contains_key(&entry.id))
        .collect();

    let delete = existing
        .iter()
        .filter(|(id, _)| !upstream.contains(id))
        .map(|(id, location)| (id.clone(), location.clone()))
        .collect();

    ReconcilePlan { create, delete }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn upstream(ids: &[&str]) -> FeatureTree<()> {
        ids.iter().map(|id| (id.to_string(), ())).collect()
    }

    fn roots(r: &[&str]) -> Vec<String> {
        r.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_annotation_is_created_at_layout_path() {
        let tree = upstream(&["api.Foo", "api.Foo.bar", "api.Qux"]);
        let existing: BTreeMap<String, String> =
            [("api.Foo".to_string(), "api/Foo/api.Foo.html".to_string())].into();
        let plan = plan(&tree, &roots(&["api"]), &existing);
        assert_eq!(
            plan.create,
            vec![
                LayoutEntry {
                    id: "api.Foo.bar".into(),
                    path: "api/Foo/api.Foo.bar".into()
                },
                LayoutEntry {
                    id: "api.Qux".into(),
                    path: "api/Qux".into()
                },
            ]
        );
        assert!(plan.delete.is_empty());
    }

    #[test]
    fn test_orphan_annotation_is_deleted() {
        let tree = upstream(&["api.Foo"]);
        let existing: BTreeMap<String, &str> = [
            ("api.Foo".to_string(), "api/Foo.html"),
            ("api.Gone".to_string(), "api/Gone.html"),
        ]
        .into();
        let plan = plan(&tree, &roots(&["api"]), &existing);
        assert!(plan.create.is_empty());
        assert_eq!(plan.delete, vec![("api.Gone".to_string(), "api/Gone.html")]);
    }

    #[test]
    fn test_grouping_id_annotation_is_orphaned() {
        let tree = upstream(&["api.Foo"]);
        let existing: BTreeMap<String, ()> = [("api".to_string(), ()), ("api.Foo".to_string(), ())].into();
        let plan = plan(&tree, &[], &existing);
        assert_eq!(plan.delete, vec![("api".to_string(), ())]);
    }

    #[test]
    fn test_roots_limit_creation_not_deletion() {
        let tree = upstream(&["api.Foo", "css.color", "html.elements.a", "html.manifest"]);
        let existing: BTreeMap<String, ()> = [("svg.gone".to_string(), ())].into();
        let plan = plan(&tree, &roots(&["api", "html.elements"]), &existing);
        let created: Vec<&str> = plan.create.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(created, vec!["api.Foo", "html.elements.a"]);
        assert_eq!(plan.delete.len(), 1);
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let tree = upstream(&["api.Foo", "api.Foo.bar", "api.Baz"]);
        let mut existing: BTreeMap<String, String> =
            [("api.Old".to_string(), "api/Old".to_string())].into();

        let first = plan(&tree, &[], &existing);
        assert_eq!(first.create.len(), 3);
        assert_eq!(first.delete.len(), 1);

        for entry in first.create {
            existing.insert(entry.id, entry.path);
        }
        for (id, _) in first.delete {
            existing.remove(&id);
        }

        let second = plan(&tree, &[], &existing);
        assert!(second.is_empty());
    }

    #[test]
    fn test_under_roots() {
        let r = roots(&["http.headers"]);
        assert!(under_roots("http.headers", &r));
        assert!(under_roots("http.headers.Accept", &r));
        assert!(!under_roots("http.headersX", &r));
        assert!(!under_roots("http", &r));
        assert!(under_roots("anything", &[]));
    }
}

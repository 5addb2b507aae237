//! Feature Tree
//!
//! A mapping-of-mappings keyed by the segments of a dot-separated feature id
//! (`api.Foo.bar`). Both the upstream dataset and the annotation set are
//! projected into this structure.
//!
//! Nodes without a value are pure grouping nodes: they exist only because a
//! descendant was set. Child order is insertion order and drives every
//! traversal, so two trees built from the same ids in the same order iterate
//! identically.

use std::collections::HashMap;

use crate::error::{CompatError, Result};

/// Join a parent id and a segment (`""` is the root).
pub fn join_id(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

/// Check that an authored id has no empty segments.
pub fn validate_feature_id(id: &str) -> Result<()> {
    if id.is_empty() || id.split('.').any(str::is_empty) {
        return Err(CompatError::InvalidFeatureId(id.to_string()));
    }
    Ok(())
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    // "" addresses the root and has no segments
    path.split('.').filter(move |_| !path.is_empty())
}

#[derive(Debug, Clone)]
pub struct FeatureTree<T> {
    value: Option<T>,
    children: Vec<(String, FeatureTree<T>)>,
    index: HashMap<String, usize>,
}

impl<T> Default for FeatureTree<T> {
    fn default() -> Self {
        Self {
            value: None,
            children: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: PartialEq> PartialEq for FeatureTree<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.children == other.children
    }
}

impl<T> FeatureTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Direct children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &FeatureTree<T>)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn child(&self, segment: &str) -> Option<&FeatureTree<T>> {
        self.index.get(segment).map(|&i| &self.children[i].1)
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut FeatureTree<T>> {
        let i = *self.index.get(segment)?;
        Some(&mut self.children[i].1)
    }

    fn child_or_insert(&mut self, segment: &str) -> &mut FeatureTree<T> {
        let i = match self.index.get(segment) {
            Some(&i) => i,
            None => {
                self.children.push((segment.to_string(), FeatureTree::new()));
                let i = self.children.len() - 1;
                self.index.insert(segment.to_string(), i);
                i
            }
        };
        &mut self.children[i].1
    }

    /// Set the value at `path`, creating grouping nodes along the way.
    /// Returns the previous value, if any.
    pub fn set(&mut self, path: &str, value: T) -> Option<T> {
        let mut node = self;
        for segment in segments(path) {
            node = node.child_or_insert(segment);
        }
        node.value.replace(value)
    }

    /// Resolve the subtree at `path` without creating anything.
    pub fn get_node(&self, path: &str) -> Result<&FeatureTree<T>> {
        let mut node = self;
        for segment in segments(path) {
            node = node
                .child(segment)
                .ok_or_else(|| CompatError::NotFound(path.to_string()))?;
        }
        Ok(node)
    }

    /// Value at `path`. `Ok(None)` means the node exists but only groups
    /// descendants; `Err(NotFound)` means some segment is absent.
    pub fn get(&self, path: &str) -> Result<Option<&T>> {
        self.get_node(path).map(FeatureTree::value)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut T> {
        let mut node = self;
        for segment in segments(path) {
            node = node.child_mut(segment)?;
        }
        node.value.as_mut()
    }

    /// True when `path` resolves to a node carrying a value.
    pub fn contains(&self, path: &str) -> bool {
        matches!(self.get(path), Ok(Some(_)))
    }

    /// `(full id, value)` for every value-bearing node strictly below `path`,
    /// depth-first, each node before its own descendants.
    pub fn descendant_entries(&self, path: &str) -> Result<DescendantEntries<'_, T>> {
        let node = self.get_node(path)?;
        Ok(DescendantEntries::new(path.to_string(), node))
    }

    /// All value-bearing entries of the tree.
    pub fn entries(&self) -> DescendantEntries<'_, T> {
        DescendantEntries::new(String::new(), self)
    }

    /// Number of value-bearing nodes, the root included.
    pub fn len(&self) -> usize {
        usize::from(self.value.is_some()) + self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canonical annotation file layout for everything strictly below `path`.
    ///
    /// - value, no children: one file, `<dirs>/<segment>`
    /// - value and children: a directory `<dirs>/<segment>/` holding one file
    ///   named after its own full id plus one per value-bearing descendant,
    ///   flattened
    /// - no value: no file of its own, its children are laid out in
    ///   `<dirs>/<segment>/`
    ///
    /// The node at `path` itself is treated as a grouping node.
    pub fn layout(&self, path: &str) -> Result<Layout<'_, T>> {
        let node = self.get_node(path)?;
        let dir_prefix = segments(path).map(|s| format!("{s}/")).collect();
        Ok(Layout::new(path.to_string(), dir_prefix, node))
    }

    /// Layout of the whole tree.
    pub fn full_layout(&self) -> Layout<'_, T> {
        Layout::new(String::new(), String::new(), self)
    }
}

impl<T> FromIterator<(String, T)> for FeatureTree<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut tree = FeatureTree::new();
        for (id, value) in iter {
            tree.set(&id, value);
        }
        tree
    }
}

// ── Traversal ─────────────────────────────────────────────────

type ChildIter<'a, T> = std::slice::Iter<'a, (String, FeatureTree<T>)>;

/// Lazy pre-order walk. Each call to `descendant_entries` starts a fresh
/// walk; the iterator is also `Clone` for restarting from a saved point.
pub struct DescendantEntries<'a, T> {
    stack: Vec<(String, ChildIter<'a, T>)>,
}

impl<'a, T> DescendantEntries<'a, T> {
    fn new(prefix: String, node: &'a FeatureTree<T>) -> Self {
        Self {
            stack: vec![(prefix, node.children.iter())],
        }
    }
}

impl<T> Clone for DescendantEntries<'_, T> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
        }
    }
}

impl<'a, T> Iterator for DescendantEntries<'a, T> {
    type Item = (String, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, children) = self.stack.last_mut()?;
            let Some((segment, node)) = children.next() else {
                self.stack.pop();
                continue;
            };
            let id = join_id(prefix, segment);
            if node.has_children() {
                self.stack.push((id.clone(), node.children.iter()));
            }
            if let Some(value) = node.value.as_ref() {
                return Some((id, value));
            }
        }
    }
}

/// One canonical annotation file: the feature it describes and its
/// `/`-separated path relative to the store root, without extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub id: String,
    pub path: String,
}

struct LayoutFrame<'a, T> {
    id_prefix: String,
    dir_prefix: String,
    children: ChildIter<'a, T>,
}

pub struct Layout<'a, T> {
    stack: Vec<LayoutFrame<'a, T>>,
    flattened: Option<(String, DescendantEntries<'a, T>)>,
}

impl<'a, T> Layout<'a, T> {
    fn new(id_prefix: String, dir_prefix: String, node: &'a FeatureTree<T>) -> Self {
        Self {
            stack: vec![LayoutFrame {
                id_prefix,
                dir_prefix,
                children: node.children.iter(),
            }],
            flattened: None,
        }
    }
}

impl<T> Iterator for Layout<'_, T> {
    type Item = LayoutEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((dir, entries)) = &mut self.flattened {
                if let Some((id, _)) = entries.next() {
                    let path = format!("{dir}{id}");
                    return Some(LayoutEntry { id, path });
                }
                self.flattened = None;
            }

            let frame = self.stack.last_mut()?;
            let Some((segment, node)) = frame.children.next() else {
                self.stack.pop();
                continue;
            };
            let id = join_id(&frame.id_prefix, segment);

            if node.value.is_none() {
                let dir_prefix = format!("{}{}/", frame.dir_prefix, segment);
                self.stack.push(LayoutFrame {
                    id_prefix: id,
                    dir_prefix,
                    children: node.children.iter(),
                });
                continue;
            }

            if !node.has_children() {
                let path = format!("{}{}", frame.dir_prefix, segment);
                return Some(LayoutEntry { id, path });
            }

            let dir = format!("{}{}/", frame.dir_prefix, segment);
            let path = format!("{dir}{id}");
            self.flattened = Some((dir, DescendantEntries::new(id.clone(), node)));
            return Some(LayoutEntry { id, path });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn tree(ids: &[(&str, i32)]) -> FeatureTree<i32> {
        ids.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn layout_paths(tree: &FeatureTree<i32>, path: &str) -> Vec<String> {
        tree.layout(path).unwrap().map(|e| e.path).collect()
    }

    #[test]
    fn test_set_creates_grouping_nodes() {
        let t = tree(&[("api.Foo.bar", 1)]);
        assert_eq!(t.get("api.Foo.bar").unwrap(), Some(&1));
        assert_eq!(t.get("api.Foo").unwrap(), None);
        assert_eq!(t.get("api").unwrap(), None);
    }

    #[test]
    fn test_get_missing_segment_is_not_found() {
        let t = tree(&[("api.Foo", 1)]);
        let err = t.get("api.Bar.baz").unwrap_err();
        assert!(matches!(err, CompatError::NotFound(ref id) if id == "api.Bar.baz"));
        // reads never create nodes
        assert!(t.get_node("api.Bar").is_err());
    }

    #[test]
    fn test_set_overwrites_and_returns_previous() {
        let mut t = tree(&[("a.b", 1)]);
        assert_eq!(t.set("a.b", 2), Some(1));
        assert_eq!(t.get("a.b").unwrap(), Some(&2));
    }

    #[test]
    fn test_root_value() {
        let mut t = FeatureTree::new();
        t.set("", 7);
        assert_eq!(t.get("").unwrap(), Some(&7));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_get_mut() {
        let mut t = tree(&[("a.b", 1)]);
        *t.get_mut("a.b").unwrap() += 10;
        assert_eq!(t.get("a.b").unwrap(), Some(&11));
        assert!(t.get_mut("a").is_none());
        assert!(t.get_mut("x").is_none());
    }

    #[test]
    fn test_descendant_entries_preorder_insertion_order() {
        let t = tree(&[("z", 1), ("z.b", 2), ("a", 3), ("z.a", 4), ("z.b.c", 5)]);
        let ids: Vec<String> = t.entries().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["z", "z.b", "z.b.c", "z.a", "a"]);
    }

    #[test]
    fn test_descendant_entries_strictly_below() {
        let t = tree(&[("a", 1), ("a.b", 2), ("a.b.c", 3), ("d", 4)]);
        let below: Vec<(String, i32)> = t
            .descendant_entries("a")
            .unwrap()
            .map(|(id, v)| (id, *v))
            .collect();
        assert_eq!(below, vec![("a.b".to_string(), 2), ("a.b.c".to_string(), 3)]);
    }

    #[test]
    fn test_descendant_entries_is_restartable() {
        let t = tree(&[("a", 1), ("a.b", 2)]);
        let first: Vec<_> = t.entries().collect();
        let second: Vec<_> = t.entries().collect();
        assert_eq!(first, second);

        let mut walk = t.entries();
        walk.next();
        let saved = walk.clone();
        assert_eq!(walk.collect::<Vec<_>>(), saved.collect::<Vec<_>>());
    }

    #[test]
    fn test_descendant_entries_skips_grouping_nodes() {
        let t = tree(&[("a.b.c", 1)]);
        let ids: Vec<String> = t.entries().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a.b.c"]);
    }

    #[test]
    fn test_layout_value_with_children_is_directory() {
        let t = tree(&[("a", 1), ("a.b", 2)]);
        assert_eq!(layout_paths(&t, ""), vec!["a/a", "a/a.b"]);
    }

    #[test]
    fn test_layout_value_under_grouping_is_single_file() {
        let t = tree(&[("a.b", 1)]);
        assert_eq!(layout_paths(&t, ""), vec!["a/b"]);
    }

    #[test]
    fn test_layout_flattens_deep_descendants() {
        let t = tree(&[
            ("api.Foo", 1),
            ("api.Foo.bar", 2),
            ("api.Foo.bar.baz", 3),
            ("api.Qux", 4),
        ]);
        let entries: Vec<LayoutEntry> = t.layout("").unwrap().collect();
        assert_eq!(
            entries,
            vec![
                LayoutEntry {
                    id: "api.Foo".into(),
                    path: "api/Foo/api.Foo".into()
                },
                LayoutEntry {
                    id: "api.Foo.bar".into(),
                    path: "api/Foo/api.Foo.bar".into()
                },
                LayoutEntry {
                    id: "api.Foo.bar.baz".into(),
                    path: "api/Foo/api.Foo.bar.baz".into()
                },
                LayoutEntry {
                    id: "api.Qux".into(),
                    path: "api/Qux".into()
                },
            ]
        );
    }

    #[test]
    fn test_layout_of_subtree_keeps_directory_prefix() {
        let t = tree(&[("html.elements.a", 1), ("html.elements.a.href", 2)]);
        assert_eq!(
            layout_paths(&t, "html.elements"),
            vec!["html/elements/a/html.elements.a", "html/elements/a/html.elements.a.href"]
        );
    }

    #[test]
    fn test_layout_covers_every_value_once() {
        let t = tree(&[("a", 1), ("a.b", 2), ("c.d", 3), ("c.d.e", 4), ("c.f", 5)]);
        let mut laid_out: Vec<String> = t.full_layout().map(|e| e.id).collect();
        let mut all: Vec<String> = t.entries().map(|(id, _)| id).collect();
        laid_out.sort();
        all.sort();
        assert_eq!(laid_out, all);
    }

    #[test]
    fn test_validate_feature_id() {
        assert!(validate_feature_id("api.Foo.bar").is_ok());
        assert!(validate_feature_id("").is_err());
        assert!(validate_feature_id("api..bar").is_err());
        assert!(validate_feature_id("api.").is_err());
    }

    fn id_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-c]{1,2}", 1..4).prop_map(|segs| segs.join("."))
    }

    proptest! {
        #[test]
        fn prop_set_then_get(ids in prop::collection::vec(id_strategy(), 1..20)) {
            let mut t = FeatureTree::new();
            for (i, id) in ids.iter().enumerate() {
                t.set(id, i);
            }
            for id in &ids {
                let last = ids.iter().rposition(|x| x == id).unwrap();
                prop_assert_eq!(t.get(id).unwrap(), Some(&last));
            }
        }

        #[test]
        fn prop_same_insertion_order_same_iteration(ids in prop::collection::vec(id_strategy(), 0..20)) {
            let a: FeatureTree<()> = ids.iter().map(|id| (id.clone(), ())).collect();
            let b: FeatureTree<()> = ids.iter().map(|id| (id.clone(), ())).collect();
            let walk_a: Vec<String> = a.entries().map(|(id, _)| id).collect();
            let walk_b: Vec<String> = b.entries().map(|(id, _)| id).collect();
            prop_assert_eq!(walk_a, walk_b);
            let layout_a: Vec<LayoutEntry> = a.layout("").unwrap().collect();
            let layout_b: Vec<LayoutEntry> = b.layout("").unwrap().collect();
            prop_assert_eq!(layout_a, layout_b);
        }
    }
}

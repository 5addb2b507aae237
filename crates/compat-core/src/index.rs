//! Feature Index
//!
//! Flattens the upstream browser-compat-data document into a
//! `FeatureTree<CompatRecord>`. Any object carrying the `__compat` marker is
//! a concrete feature; every other object key is a grouping key that is
//! walked but never indexed itself.

use serde_json::{Map, Value};
use tracing::debug;

use crate::compat::CompatRecord;
use crate::error::{CompatError, Result};
use crate::feature_tree::{join_id, FeatureTree};
use crate::support::Support;

/// Reserved key marking a concrete feature record.
pub const COMPAT_KEY: &str = "__compat";
/// Top-level key holding browser metadata rather than features.
pub const BROWSERS_KEY: &str = "browsers";
/// Top-level key holding dataset version metadata.
pub const META_KEY: &str = "__meta";

/// The upstream dataset, split into browser metadata and indexed features.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub browsers: Map<String, Value>,
    pub features: FeatureTree<CompatRecord>,
}

impl Dataset {
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(CompatError::Malformed {
                feature_id: String::new(),
                message: "dataset root is not an object".into(),
            });
        };

        let browsers = match root.remove(BROWSERS_KEY) {
            Some(Value::Object(browsers)) => browsers,
            Some(_) => {
                return Err(CompatError::Malformed {
                    feature_id: BROWSERS_KEY.into(),
                    message: "browser metadata is not an object".into(),
                })
            }
            None => Map::new(),
        };
        root.remove(META_KEY);

        let features = index_features(&root)?;
        debug!(
            browsers = browsers.len(),
            features = features.len(),
            "indexed upstream dataset"
        );
        Ok(Self { browsers, features })
    }

    /// Every concrete feature id, in upstream order.
    pub fn feature_ids(&self) -> impl Iterator<Item = String> + '_ {
        self.features.entries().map(|(id, _)| id)
    }

    /// Support tree with every upstream feature at `UNKNOWN`, in upstream
    /// order, ready for annotations to be laid over it.
    pub fn unknown_support_tree(&self) -> FeatureTree<Support> {
        self.feature_ids().map(|id| (id, Support::Unknown)).collect()
    }
}

/// Recursive descent over grouping keys, indexing every `__compat` record.
pub fn index_features(root: &Map<String, Value>) -> Result<FeatureTree<CompatRecord>> {
    let mut tree = FeatureTree::new();
    descend(root, "", &mut tree)?;
    Ok(tree)
}

fn descend(node: &Map<String, Value>, prefix: &str, tree: &mut FeatureTree<CompatRecord>) -> Result<()> {
    for (key, child) in node {
        if key == COMPAT_KEY {
            continue;
        }
        let Value::Object(child) = child else {
            continue;
        };

        let feature_id = join_id(prefix, key);
        if let Some(compat) = child.get(COMPAT_KEY) {
            let record: CompatRecord =
                serde_json::from_value(compat.clone()).map_err(|e| CompatError::Malformed {
                    feature_id: feature_id.clone(),
                    message: e.to_string(),
                })?;
            tree.set(&feature_id, record);
        }
        descend(child, &feature_id, tree)?;
    }
    Ok(())
}

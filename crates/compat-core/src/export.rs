//! Exporter
//!
//! One self-contained artifact per concrete feature, shaped like the MDN
//! BCD API response so the documentation site can fetch it in place of the
//! upstream one: `{browsers, query, data}`.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::compat::CompatRecord;
use crate::feature_tree::FeatureTree;
use crate::overlay::SyntheticBrowser;

/// Browser legend: each allow-listed real browser followed by its synthetic
/// sibling. Browsers missing from the upstream metadata are left out, as are
/// ids that are themselves synthetic columns.
pub fn browser_legend(
    upstream: &Map<String, Value>,
    browsers: &[String],
    synthetic: &SyntheticBrowser,
) -> Map<String, Value> {
    let mut legend = Map::new();
    for browser_id in browsers {
        if synthetic.is_column(browser_id) {
            continue;
        }
        let Some(meta) = upstream.get(browser_id) else {
            debug!(browser = %browser_id, "browser missing from upstream metadata");
            continue;
        };
        legend.insert(browser_id.clone(), meta.clone());

        let mut synthetic_meta = meta.clone();
        if let Value::Object(fields) = &mut synthetic_meta {
            let real_name = fields
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(browser_id.as_str());
            let name = synthetic.display_name(real_name);
            fields.insert("name".into(), Value::String(name));
        }
        legend.insert(synthetic.column_id(browser_id), synthetic_meta);
    }
    legend
}

#[derive(Debug, Clone, Serialize)]
pub struct Artifact<'a> {
    pub browsers: &'a Map<String, Value>,
    pub query: String,
    pub data: &'a CompatRecord,
}

/// Artifacts in upstream depth-first order, one per concrete feature.
/// Grouping nodes are walked but never emitted.
pub fn artifacts<'a>(
    features: &'a FeatureTree<CompatRecord>,
    legend: &'a Map<String, Value>,
) -> impl Iterator<Item = Artifact<'a>> + 'a {
    features.entries().map(move |(query, data)| Artifact {
        browsers: legend,
        query,
        data,
    })
}

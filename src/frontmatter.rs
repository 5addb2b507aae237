//! YAML front matter
//!
//! Annotation files and documentation pages share one format:
//!
//! ```text
//! ---
//! <yaml mapping>
//! ---
//! <body>
//! ```
//!
//! A document that does not open with a fence has no front matter.

use anyhow::{bail, Result};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

const FENCE: &str = "---";

#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub fields: Mapping,
    /// Text after the closing fence, trimmed
    pub body: String,
}

impl FrontMatter {
    /// Deserialize the fields into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_yaml::from_value(Value::Mapping(self.fields.clone()))?)
    }
}

/// `(yaml, body)` when the document opens with a fence.
fn split(text: &str) -> Result<Option<(&str, &str)>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = strip_fence_line(text) else {
        return Ok(None);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok(Some((yaml, body)));
        }
        offset += line.len();
    }
    bail!("front matter is not closed by a '{FENCE}' line")
}

fn strip_fence_line(text: &str) -> Option<&str> {
    let (first, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (text, ""),
    };
    (first.trim_end() == FENCE).then_some(rest)
}

pub fn parse_front_matter(text: &str) -> Result<FrontMatter> {
    let Some((yaml, body)) = split(text)? else {
        return Ok(FrontMatter {
            fields: Mapping::new(),
            body: text.trim().to_string(),
        });
    };

    if yaml.trim().is_empty() {
        return Ok(FrontMatter {
            fields: Mapping::new(),
            body: body.trim().to_string(),
        });
    }

    let fields = match serde_yaml::from_str::<Value>(yaml)? {
        Value::Null => Mapping::new(),
        Value::Mapping(fields) => fields,
        other => bail!("front matter is not a mapping: {other:?}"),
    };
    Ok(FrontMatter {
        fields,
        body: body.trim().to_string(),
    })
}

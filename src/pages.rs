//! Documentation pages
//!
//! Pages are `index.md` files whose front matter names the compat tables
//! they render (`browser-compat`) and the page `slug`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use compat_core::{OneOrMany, Page};
use serde::Deserialize;
use tracing::{debug, info};

use crate::frontmatter::parse_front_matter;

pub const PAGE_FILE: &str = "index.md";

pub trait PageSource {
    fn pages(&self) -> Result<Vec<Page>>;
}

#[derive(Debug, Deserialize)]
struct PageFields {
    #[serde(default)]
    slug: Option<String>,
    #[serde(default, rename = "browser-compat")]
    browser_compat: Option<OneOrMany<String>>,
}

/// `None` for pages that render no compat table.
pub fn parse_page(text: &str) -> Result<Option<Page>> {
    let fields: PageFields = parse_front_matter(text)?.decode()?;
    let (Some(slug), Some(features)) = (fields.slug, fields.browser_compat) else {
        return Ok(None);
    };
    Ok(Some(Page {
        slug,
        features: features.into_vec(),
    }))
}

/// A checkout of the documentation content.
pub struct MarkdownPages {
    root: PathBuf,
}

impl MarkdownPages {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PageSource for MarkdownPages {
    fn pages(&self) -> Result<Vec<Page>> {
        let pattern = format!(
            "{}/**/{PAGE_FILE}",
            glob::Pattern::escape(&self.root.display().to_string())
        );

        let mut pages = Vec::new();
        let mut scanned = 0usize;
        for entry in glob::glob(&pattern)? {
            let path = entry?;
            scanned += 1;
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match parse_page(&content).with_context(|| format!("Failed to parse {}", path.display()))? {
                Some(page) => pages.push(page),
                None => debug!("No compat tables in {}", path.display()),
            }
        }

        info!(
            "Found {} pages with compat tables ({} scanned) under {}",
            pages.len(),
            scanned,
            self.root.display()
        );
        Ok(pages)
    }
}

//! Annotation store
//!
//! One HTML file per annotated feature under `features_dir`, front matter
//! carrying the support fields and the body holding free-text notes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use compat_core::{validate_feature_id, Annotation, LayoutEntry, OneOrMany, Support};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::frontmatter::parse_front_matter;

pub const ANNOTATION_EXTENSION: &str = "html";

/// Supplies the authored annotations.
pub trait AnnotationSource {
    fn annotations(&self) -> Result<Vec<Annotation>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubOutcome {
    Created,
    AlreadyPresent,
}

/// Creates and deletes annotation files during reconciliation.
pub trait AnnotationStore {
    /// Every annotated id and the file holding it.
    fn existing(&self) -> Result<BTreeMap<String, PathBuf>>;

    fn create_stub(&self, entry: &LayoutEntry) -> Result<StubOutcome>;

    /// Whether a file already sits where `entry` would be created.
    fn is_occupied(&self, entry: &LayoutEntry) -> bool;

    fn remove(&self, id: &str, location: &Path) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct AnnotationFields {
    id: String,
    support: String,
    #[serde(default)]
    limitations: Option<OneOrMany<String>>,
    #[serde(default)]
    icf_support: Option<String>,
    #[serde(default)]
    icf_limitations: Option<OneOrMany<String>>,
}

#[derive(Serialize)]
struct StubFields<'a> {
    id: &'a str,
    support: &'static str,
}

/// Trimmed entries of a one-or-many field; blank entries are dropped.
fn list(values: Option<OneOrMany<String>>) -> Vec<String> {
    values
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Parse one annotation document.
pub fn parse_annotation(text: &str) -> Result<Annotation> {
    let front_matter = parse_front_matter(text)?;
    let fields: AnnotationFields = front_matter.decode()?;
    validate_feature_id(&fields.id)?;

    let support: Support = fields.support.parse()?;
    let icf_support = fields
        .icf_support
        .as_deref()
        .map(|name| name.parse::<Support>())
        .transpose()?;

    Ok(Annotation {
        id: fields.id,
        support,
        limitations: list(fields.limitations),
        icf_support,
        icf_limitations: list(fields.icf_limitations),
        note: (!front_matter.body.is_empty()).then_some(front_matter.body),
    })
}

/// Body of a freshly scaffolded annotation.
pub fn stub_document(id: &str) -> Result<String> {
    let fields = serde_yaml::to_string(&StubFields {
        id,
        support: Support::Unknown.as_str(),
    })?;
    Ok(format!("---\n{fields}---\n"))
}

/// Annotation files on disk.
pub struct FrontMatterStore {
    root: PathBuf,
}

impl FrontMatterStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a layout path.
    pub fn path_for(&self, layout_path: &str) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(layout_path.split('/'));
        // ids contain dots, so append rather than replace an extension
        let mut path = path.into_os_string();
        path.push(format!(".{ANNOTATION_EXTENSION}"));
        PathBuf::from(path)
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            debug!("Annotation store {} does not exist", self.root.display());
            return Ok(Vec::new());
        }
        let pattern = format!(
            "{}/**/*.{ANNOTATION_EXTENSION}",
            glob::Pattern::escape(&self.root.display().to_string())
        );
        let mut files = Vec::new();
        for entry in glob::glob(&pattern)? {
            files.push(entry?);
        }
        Ok(files)
    }

    /// Every annotation and its file, rejecting a second file for the same id.
    fn scan(&self) -> Result<Vec<(PathBuf, Annotation)>> {
        let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut scanned = Vec::new();
        for path in self.files()? {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let annotation = parse_annotation(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;

            if let Some(previous) = seen.insert(annotation.id.clone(), path.clone()) {
                bail!(
                    "feature {} is annotated twice: {} and {}",
                    annotation.id,
                    previous.display(),
                    path.display()
                );
            }
            scanned.push((path, annotation));
        }
        Ok(scanned)
    }

    /// Remove directories left empty below the store root.
    fn prune_empty_dirs(&self, from: &Path) -> Result<()> {
        let mut dir = from;
        while dir != self.root.as_path() && dir.starts_with(&self.root) {
            let is_empty = std::fs::read_dir(dir)
                .with_context(|| format!("Failed to read {}", dir.display()))?
                .next()
                .is_none();
            if !is_empty {
                break;
            }
            std::fs::remove_dir(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
            debug!("Removed empty directory {}", dir.display());
            let Some(parent) = dir.parent() else { break };
            dir = parent;
        }
        Ok(())
    }
}

impl AnnotationSource for FrontMatterStore {
    fn annotations(&self) -> Result<Vec<Annotation>> {
        let annotations: Vec<Annotation> = self.scan()?.into_iter().map(|(_, a)| a).collect();
        info!(
            "Loaded {} annotations from {}",
            annotations.len(),
            self.root.display()
        );
        Ok(annotations)
    }
}

impl AnnotationStore for FrontMatterStore {
    fn existing(&self) -> Result<BTreeMap<String, PathBuf>> {
        Ok(self
            .scan()?
            .into_iter()
            .map(|(path, annotation)| (annotation.id, path))
            .collect())
    }

    fn is_occupied(&self, entry: &LayoutEntry) -> bool {
        self.path_for(&entry.path).exists()
    }

    fn create_stub(&self, entry: &LayoutEntry) -> Result<StubOutcome> {
        let path = self.path_for(&entry.path);
        if path.exists() {
            return Ok(StubOutcome::AlreadyPresent);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, stub_document(&entry.id)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(StubOutcome::Created)
    }

    fn remove(&self, id: &str, location: &Path) -> Result<()> {
        std::fs::remove_file(location)
            .with_context(|| format!("Failed to remove {} ({id})", location.display()))?;
        if let Some(parent) = location.parent() {
            self.prune_empty_dirs(parent)?;
        }
        Ok(())
    }
}

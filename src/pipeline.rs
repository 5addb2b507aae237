//! Pipeline
//!
//! Composes the core components against their I/O collaborators. The
//! upstream dataset and the annotation set are shared by every operation;
//! the page source, annotation store and artifact sink are handed to the
//! operation that needs them.

use anyhow::{Context, Result};
use compat_core::{
    artifacts, browser_legend, build_overlay, plan, support_tree, Dataset, LayoutEntry,
    OverlayEngine, OverlayMap, OverlayStats,
};
use tracing::{error, info, warn};

use crate::annotations::{AnnotationSource, AnnotationStore, StubOutcome};
use crate::config::Config;
use crate::pages::PageSource;
use crate::sink::ArtifactSink;
use crate::sources::DatasetSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub overlay: OverlayStats,
    pub artifacts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Stubs created, or that would be created on a dry run
    pub created: Vec<LayoutEntry>,
    /// Orphaned annotation ids removed, or that would be removed
    pub deleted: Vec<String>,
    /// Missing annotations whose target file already existed
    pub already_present: Vec<LayoutEntry>,
    /// Ids whose create or delete failed; the run carries on past them
    pub failed: Vec<String>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty()
    }
}

pub struct Pipeline<'a> {
    engine: OverlayEngine,
    scaffold_roots: Vec<String>,
    dataset: &'a dyn DatasetSource,
    annotations: &'a dyn AnnotationSource,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        engine: OverlayEngine,
        scaffold_roots: Vec<String>,
        dataset: &'a dyn DatasetSource,
        annotations: &'a dyn AnnotationSource,
    ) -> Self {
        Self {
            engine,
            scaffold_roots,
            dataset,
            annotations,
        }
    }

    pub fn from_config(
        config: &Config,
        dataset: &'a dyn DatasetSource,
        annotations: &'a dyn AnnotationSource,
    ) -> Self {
        let engine = OverlayEngine::new(config.synthetic.clone(), config.browsers.clone());
        Self::new(engine, config.scaffold_roots.clone(), dataset, annotations)
    }

    fn load_dataset(&self) -> Result<Dataset> {
        let value = self.dataset.load()?;
        let dataset = Dataset::from_value(value).context("Failed to index upstream dataset")?;
        info!(
            "Indexed {} upstream features and {} browsers",
            dataset.features.len(),
            dataset.browsers.len()
        );
        Ok(dataset)
    }

    /// Overlay every annotation, then write one artifact per feature.
    pub fn export(&self, sink: &mut dyn ArtifactSink) -> Result<ExportReport> {
        let mut dataset = self.load_dataset()?;
        let annotations = self.annotations.annotations()?;

        let overlay = self.engine.apply_all(&mut dataset.features, &annotations);
        info!(
            "Applied {} annotations ({} synthetic columns, {} without upstream feature)",
            overlay.annotated, overlay.columns, overlay.skipped
        );

        let legend = browser_legend(
            &dataset.browsers,
            self.engine.browsers(),
            self.engine.synthetic(),
        );
        let mut written = 0;
        for artifact in artifacts(&dataset.features, &legend) {
            sink.write(&artifact)?;
            written += 1;
        }
        sink.finish()?;

        Ok(ExportReport {
            overlay,
            artifacts: written,
        })
    }

    /// Page slug -> sparse support tables.
    pub fn overlay(&self, pages: &dyn PageSource) -> Result<OverlayMap> {
        let dataset = self.load_dataset()?;
        let annotations = self.annotations.annotations()?;
        let tree = support_tree(dataset.unknown_support_tree(), &annotations);

        let overlay = build_overlay(pages.pages()?, &tree);
        info!("Built overlay for {} pages", overlay.len());
        Ok(overlay)
    }

    /// Bring the annotation store in line with upstream.
    pub fn reconcile(&self, store: &dyn AnnotationStore, dry_run: bool) -> Result<ReconcileReport> {
        let dataset = self.load_dataset()?;
        let existing = store.existing()?;
        let plan = plan(&dataset.features, &self.scaffold_roots, &existing);

        let mut report = ReconcileReport::default();
        for entry in plan.create {
            if dry_run {
                if store.is_occupied(&entry) {
                    report.already_present.push(entry);
                } else {
                    info!("Would create {} at {}", entry.id, entry.path);
                    report.created.push(entry);
                }
                continue;
            }
            match store.create_stub(&entry) {
                Ok(StubOutcome::Created) => {
                    warn!("Created stub for {} at {}", entry.id, entry.path);
                    report.created.push(entry);
                }
                Ok(StubOutcome::AlreadyPresent) => report.already_present.push(entry),
                Err(e) => {
                    error!("Failed to create stub for {}: {:#}", entry.id, e);
                    report.failed.push(entry.id);
                }
            }
        }

        for (id, location) in plan.delete {
            if dry_run {
                info!("Would delete {} ({})", id, location.display());
                report.deleted.push(id);
                continue;
            }
            match store.remove(&id, &location) {
                Ok(()) => {
                    warn!("Deleted orphaned annotation {} ({})", id, location.display());
                    report.deleted.push(id);
                }
                Err(e) => {
                    error!("Failed to delete {}: {:#}", id, e);
                    report.failed.push(id);
                }
            }
        }

        info!(
            "Reconciled: {} created, {} deleted, {} already present, {} failed",
            report.created.len(),
            report.deleted.len(),
            report.already_present.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Canonical layout of every upstream feature under the scaffold roots.
    pub fn layout(&self) -> Result<Vec<LayoutEntry>> {
        let dataset = self.load_dataset()?;
        Ok(dataset
            .features
            .full_layout()
            .filter(|entry| compat_core::under_roots(&entry.id, &self.scaffold_roots))
            .collect())
    }
}

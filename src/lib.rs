//! surfly-compat - Surfly support overlay for MDN browser-compat-data
//!
//! Reads upstream compat data, the authored Surfly annotations and the MDN
//! documentation pages, and produces:
//! - one per-feature artifact with synthetic `surfly_<browser>` columns
//! - the page -> sparse support tables overlay
//! - a reconciled annotation store with one file per upstream feature
//!
//! The rules live in `compat_core`; this crate supplies the I/O.
//!
//! ```rust,no_run
//! use surfly_compat::{Config, FileDatasetSource, FrontMatterStore, Pipeline, DirectorySink};
//!
//! let config = Config::default();
//! let dataset = FileDatasetSource::new("data.json");
//! let store = FrontMatterStore::new(&config.features_dir);
//! let pipeline = Pipeline::from_config(&config, &dataset, &store);
//! let mut sink = DirectorySink::new(&config.output_dir)?;
//! pipeline.export(&mut sink)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod annotations;
pub mod config;
pub mod frontmatter;
pub mod pages;
pub mod pipeline;
pub mod sink;
pub mod sources;

pub use annotations::{AnnotationSource, AnnotationStore, FrontMatterStore, StubOutcome};
pub use config::{Config, ConfigLoader};
pub use pages::{MarkdownPages, PageSource};
pub use pipeline::{ExportReport, Pipeline, ReconcileReport};
pub use sink::{ArtifactSink, DirectorySink, MemorySink};
pub use sources::{DatasetSource, FileDatasetSource, HttpDatasetSource, StaticDatasetSource};

pub use compat_core;

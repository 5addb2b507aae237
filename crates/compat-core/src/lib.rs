//! compat-core: feature tree and overlay rules for Surfly compat data
//!
//! This crate contains the pure logic with NO filesystem or network access:
//! - Support levels and their wire integers
//! - FeatureTree, the dot-id keyed tree behind both datasets
//! - Typed compat records and the upstream Feature Index
//! - Overlay Engine deriving the synthetic browser columns
//! - Sparse per-page support tables
//! - Annotation layout and reconcile planning
//! - Per-feature export artifacts
//!
//! Reading annotations, fetching upstream data and writing artifacts live in
//! the `surfly-compat` crate.

pub mod compat;
pub mod error;
pub mod export;
pub mod feature_tree;
pub mod index;
pub mod overlay;
pub mod reconcile;
pub mod support;
pub mod tables;

// Re-export commonly used types
pub use compat::{CompatRecord, Notes, OneOrMany, VersionEntry, VersionValue};
pub use error::{CompatError, Result};
pub use export::{artifacts, browser_legend, Artifact};
pub use feature_tree::{join_id, validate_feature_id, FeatureTree, Layout, LayoutEntry};
pub use index::Dataset;
pub use overlay::{support_tree, Annotation, OverlayEngine, OverlayStats, SyntheticBrowser};
pub use reconcile::{plan, under_roots, ReconcilePlan};
pub use support::Support;
pub use tables::{build_overlay, unpad_right, OverlayMap, Page, SupportTable};

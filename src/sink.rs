//! Artifact sinks

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use compat_core::Artifact;
use tracing::info;

/// Receives one export artifact per concrete feature.
pub trait ArtifactSink {
    fn write(&mut self, artifact: &Artifact<'_>) -> Result<()>;

    /// Called once after the last artifact.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// `<dir>/<feature id>.json`, compact, each file persisted atomically.
pub struct DirectorySink {
    dir: PathBuf,
    written: usize,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self { dir, written: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, feature_id: &str) -> PathBuf {
        self.dir.join(format!("{feature_id}.json"))
    }
}

impl ArtifactSink for DirectorySink {
    fn write(&mut self, artifact: &Artifact<'_>) -> Result<()> {
        let path = self.artifact_path(&artifact.query);

        let mut file = tempfile::NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Failed to create temporary file in {}", self.dir.display()))?;
        serde_json::to_writer(&mut file, artifact)
            .with_context(|| format!("Failed to serialize {}", artifact.query))?;
        file.flush()
            .with_context(|| format!("Failed to write {}", path.display()))?;
        file.persist(&path)
            .with_context(|| format!("Failed to persist {}", path.display()))?;

        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        info!("Wrote {} artifacts to {}", self.written, self.dir.display());
        Ok(())
    }
}

/// Keeps serialized artifacts in memory, keyed by feature id.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub artifacts: Vec<(String, serde_json::Value)>,
}

impl ArtifactSink for MemorySink {
    fn write(&mut self, artifact: &Artifact<'_>) -> Result<()> {
        let value = serde_json::to_value(artifact)?;
        self.artifacts.push((artifact.query.clone(), value));
        Ok(())
    }
}

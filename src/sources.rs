//! Upstream dataset sources

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

/// Where the upstream browser-compat-data document comes from.
pub trait DatasetSource {
    fn load(&self) -> Result<Value>;
}

pub struct HttpDatasetSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpDatasetSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("surfly-compat/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl DatasetSource for HttpDatasetSource {
    fn load(&self) -> Result<Value> {
        info!("Downloading upstream dataset from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch {}", self.url))?;
        response
            .json()
            .with_context(|| format!("Failed to decode {}", self.url))
    }
}

/// A local copy of `data.json`.
pub struct FileDatasetSource {
    path: PathBuf,
}

impl FileDatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for FileDatasetSource {
    fn load(&self) -> Result<Value> {
        info!("Reading upstream dataset from {}", self.path.display());
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }
}

/// An already-decoded document, for tests and embedding.
pub struct StaticDatasetSource(pub Value);

impl DatasetSource for StaticDatasetSource {
    fn load(&self) -> Result<Value> {
        Ok(self.0.clone())
    }
}

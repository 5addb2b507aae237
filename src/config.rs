//! Configuration loader
//!
//! Loads `surfly-compat.yaml` and fills every missing field with a default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use compat_core::SyntheticBrowser;
use serde::Deserialize;
use tracing::info;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SURFLY_COMPAT_CONFIG";
/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "surfly-compat.yaml";

pub const DEFAULT_UPSTREAM_URL: &str =
    "https://unpkg.com/@mdn/browser-compat-data@latest/data.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub upstream_url: String,
    /// Root of the annotation store
    pub features_dir: PathBuf,
    /// Root of the documentation pages
    pub pages_dir: PathBuf,
    /// Where per-feature artifacts are written
    pub output_dir: PathBuf,
    /// Real browsers that get a synthetic column, in legend order
    pub browsers: Vec<String>,
    pub synthetic: SyntheticBrowser,
    /// Feature subtrees that receive stub annotations
    pub scaffold_roots: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.into(),
            features_dir: "features".into(),
            pages_dir: "mdn/files/en-us/web".into(),
            output_dir: "scd".into(),
            browsers: [
                "chrome",
                "chrome_android",
                "edge",
                "firefox",
                "firefox_android",
                "safari",
                "safari_ios",
            ]
            .map(String::from)
            .to_vec(),
            synthetic: SyntheticBrowser::default(),
            scaffold_roots: [
                "api",
                "html.elements",
                "html.global_attributes",
                "http.data-url",
                "http.headers",
                "javascript",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file is a valid, all-defaults config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Resolve the config file
    ///
    /// Path resolution order:
    /// 1. `explicit` (the `--config` flag)
    /// 2. SURFLY_COMPAT_CONFIG environment variable
    /// 3. `surfly-compat.yaml` in the working directory, if it exists
    /// 4. No file: built-in defaults
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::resolve(explicit, from_env, Path::new(""))
    }

    /// Same order as [`ConfigLoader::from_env`], with the working directory
    /// given as `dir`.
    fn resolve(explicit: Option<PathBuf>, from_env: Option<PathBuf>, dir: &Path) -> Self {
        if explicit.is_some() {
            return Self::new(explicit);
        }

        if from_env.is_some() {
            return Self::new(from_env);
        }

        let local = dir.join(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::new(Some(local));
        }

        Self::new(None)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load(&self) -> Result<Config> {
        let Some(path) = &self.path else {
            info!("No config file found, using defaults");
            return Ok(Config::default());
        };
        info!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Config::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

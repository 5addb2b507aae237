//! surfly-compat CLI
//!
//! Usage:
//!   surfly-compat export [--dataset data.json]
//!   surfly-compat overlay [--output overlay.json]
//!   surfly-compat populate [--dry-run]
//!   surfly-compat layout

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use surfly_compat::{
    Config, ConfigLoader, DatasetSource, DirectorySink, FileDatasetSource, FrontMatterStore,
    HttpDatasetSource, MarkdownPages, Pipeline,
};

#[derive(Parser)]
#[command(name = "surfly-compat")]
#[command(about = "Surfly support overlay for MDN browser-compat-data")]
struct Cli {
    /// Config file (default: $SURFLY_COMPAT_CONFIG, then ./surfly-compat.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Upstream data.json to read instead of downloading it
    #[arg(long, global = true, env = "SURFLY_COMPAT_DATASET")]
    dataset: Option<PathBuf>,

    /// Annotation store root
    #[arg(long, global = true)]
    features_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write one artifact per upstream feature with Surfly columns added
    Export {
        /// Artifact directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Print the page -> support tables overlay as JSON
    Overlay {
        /// Documentation pages root
        #[arg(long)]
        pages_dir: Option<PathBuf>,
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Create missing annotation stubs and delete orphaned annotations
    Populate {
        /// Report what would change without touching the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the canonical annotation layout
    Layout,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logging goes to stderr; stdout carries overlay and layout output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surfly_compat=info,compat_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = ConfigLoader::from_env(cli.config.clone()).load()?;
    if let Some(dir) = &cli.features_dir {
        config.features_dir = dir.clone();
    }

    let dataset = dataset_source(&cli, &config)?;
    let store = FrontMatterStore::new(&config.features_dir);

    match cli.command {
        Command::Export { output_dir } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            let pipeline = Pipeline::from_config(&config, dataset.as_ref(), &store);
            let mut sink = DirectorySink::new(&config.output_dir)?;
            let report = pipeline.export(&mut sink)?;
            tracing::info!(
                "Exported {} features ({} annotated)",
                report.artifacts,
                report.overlay.annotated
            );
        }
        Command::Overlay { pages_dir, output } => {
            if let Some(dir) = pages_dir {
                config.pages_dir = dir;
            }
            let pipeline = Pipeline::from_config(&config, dataset.as_ref(), &store);
            let overlay = pipeline.overlay(&MarkdownPages::new(&config.pages_dir))?;
            let json = serde_json::to_string(&overlay)?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => writeln!(std::io::stdout(), "{json}")?,
            }
        }
        Command::Populate { dry_run } => {
            let pipeline = Pipeline::from_config(&config, dataset.as_ref(), &store);
            let report = pipeline.reconcile(&store, dry_run)?;
            if dry_run && !report.is_noop() {
                tracing::info!("Dry run: annotation store left unchanged");
            }
        }
        Command::Layout => {
            let pipeline = Pipeline::from_config(&config, dataset.as_ref(), &store);
            let mut stdout = std::io::stdout().lock();
            for entry in pipeline.layout()? {
                writeln!(stdout, "{}\t{}", entry.id, entry.path)?;
            }
        }
    }

    Ok(())
}

fn dataset_source(cli: &Cli, config: &Config) -> Result<Box<dyn DatasetSource>> {
    Ok(match &cli.dataset {
        Some(path) => Box::new(FileDatasetSource::new(path)),
        None => Box::new(HttpDatasetSource::new(&config.upstream_url)?),
    })
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use object_store::ObjectStore;
use object_store::local::LocalFileSystem;

/// MongoDB deployment used when `MONGODB_URI` is not set.
pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";

/// Recommender executable used when `MINDEXER_BIN` is not set.
pub const DEFAULT_MINDEXER_BIN: &str = "mindexer";

/// Experiment directory used when `INDEX_BENCH_BASE_PATH` is not set.
pub const DEFAULT_BASE_PATH: &str = "experiments";

/// Creates a local object store rooted at `base_path`, creating the directory if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or opened.
pub fn create_artifact_store(base_path: &Path) -> anyhow::Result<Arc<dyn ObjectStore>> {
    std::fs::create_dir_all(base_path).with_context(|| {
        format!(
            "Failed to create artifact directory {}",
            base_path.display()
        )
    })?;

    let store = LocalFileSystem::new_with_prefix(base_path)
        .context("Failed to create artifact store")?;

    Ok(Arc::new(store))
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection string
    pub mongodb_uri: String,

    /// Path or name of the index recommendation executable
    pub mindexer_bin: String,

    /// Base directory for experiment runs and logs
    pub base_path: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `MONGODB_URI`: MongoDB connection string (default: `mongodb://localhost:27017`)
    /// - `MINDEXER_BIN`: recommender executable (default: `mindexer`)
    /// - `INDEX_BENCH_BASE_PATH`: experiment output directory (default: `experiments`)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file
        dotenvy::dotenv().ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the MongoDB URI has an unknown scheme or the
    /// recommender executable is empty.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mongodb_uri =
            lookup("MONGODB_URI").unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string());

        if !(mongodb_uri.starts_with("mongodb://") || mongodb_uri.starts_with("mongodb+srv://")) {
            bail!("MONGODB_URI must start with mongodb:// or mongodb+srv://, got {mongodb_uri}");
        }

        let mindexer_bin =
            lookup("MINDEXER_BIN").unwrap_or_else(|| DEFAULT_MINDEXER_BIN.to_string());

        if mindexer_bin.trim().is_empty() {
            bail!("MINDEXER_BIN must not be empty");
        }

        let base_path = lookup("INDEX_BENCH_BASE_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_BASE_PATH), PathBuf::from);

        Ok(Self {
            mongodb_uri,
            mindexer_bin,
            base_path,
        })
    }
}

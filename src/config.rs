use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const CONFIG_FILE_NAME: &str = "quaketrend.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Event type a raw row must carry to survive cleaning.
    pub event_type: String,
    /// Rows below this magnitude are dropped during cleaning.
    pub min_magnitude: f64,
    /// Latest N years held out for metrics. Zero scores on the training set.
    pub holdout_years: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            event_type: "earthquake".into(),
            min_magnitude: 3.5,
            holdout_years: 0,
        }
    }
}

/// k-means parameters for the exploratory spatial pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub cluster_count: usize,
    pub seed: u64,
    pub max_iterations: usize,
    /// Stop once no centroid moves further than this (degrees).
    pub tolerance: f64,
    pub samples_per_cluster: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            cluster_count: 8,
            seed: 42,
            max_iterations: 300,
            tolerance: 1e-4,
            samples_per_cluster: 3,
        }
    }
}

impl ClusteringConfig {
    /// The seed is stored in a signed SQLite INTEGER column, so it must fit
    /// in an `i64`.
    pub fn validate(&self) -> Result<()> {
        if self.cluster_count == 0 {
            bail!("clustering.cluster_count must be at least 1");
        }
        if i64::try_from(self.seed).is_err() {
            bail!(
                "clustering.seed {} exceeds the largest storable seed {}",
                self.seed,
                i64::MAX
            );
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            bail!("clustering.tolerance must be a finite positive number");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            open_browser: true,
        }
    }
}

/// Every input and output location of the pipeline, plus per-stage settings.
///
/// Relative paths are resolved against the root directory handed to
/// [`PipelineConfig::load`], never against the process working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub raw_csv: PathBuf,
    pub cleaned_csv: PathBuf,
    pub frequency_csv: PathBuf,
    pub model_db: PathBuf,
    pub metadata_json: PathBuf,
    pub export_dir: PathBuf,
    pub training: TrainingConfig,
    pub clustering: ClusteringConfig,
    pub server: ServerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_csv: PathBuf::from("data/earthquakes.csv"),
            cleaned_csv: PathBuf::from("data/training.csv"),
            frequency_csv: PathBuf::from("data/frequency.csv"),
            model_db: PathBuf::from("data/earthquake_model.sqlite3"),
            metadata_json: PathBuf::from("data/model_info.json"),
            export_dir: PathBuf::from("web"),
            training: TrainingConfig::default(),
            clustering: ClusteringConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read the config file if it exists, fall back to defaults otherwise, and
    /// anchor all relative paths at `root`.
    pub fn load(config_path: Option<&Path>, root: &Path) -> Result<Self> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));

        let config: PipelineConfig = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            PipelineConfig::default()
        };
        config
            .clustering
            .validate()
            .with_context(|| format!("Invalid config at {}", path.display()))?;

        Ok(config.resolved(root))
    }

    /// Defaults anchored at `root`.
    pub fn rooted(root: &Path) -> Self {
        PipelineConfig::default().resolved(root)
    }

    pub fn resolved(mut self, root: &Path) -> Self {
        for path in [
            &mut self.raw_csv,
            &mut self.cleaned_csv,
            &mut self.frequency_csv,
            &mut self.model_db,
            &mut self.metadata_json,
            &mut self.export_dir,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

//! Configuration for a pipeline run.
//!
//! Every value has a default matching the reference training setup
//! (20 epochs, batch size 64, 100×100 inputs). A TOML file can override any
//! section and CLI flags override individual values on top of that.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::utils::error::{PipelineError, Result};
use crate::{BATCH_SIZE, EPOCHS, IMAGE_SIZE};

/// Smallest input side the four conv/pool blocks can reduce without
/// collapsing a feature map to zero.
pub const MIN_IMAGE_SIZE: usize = 46;

/// Full configuration of a training + evaluation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Dataset location and preprocessing
    pub data: DataConfig,
    /// Optimisation hyperparameters
    pub training: TrainingParams,
    /// Artifact locations
    pub output: OutputConfig,
    /// Device selection
    pub device: DeviceConfig,
}

/// Dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root directory holding `train/`, `validation/` and `test/`
    pub data_dir: PathBuf,
    /// Side length images are resized to
    pub image_size: usize,
    /// Whether the training split is reshuffled every epoch
    pub shuffle_train: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/PlantVillage2"),
            image_size: IMAGE_SIZE,
            shuffle_train: true,
        }
    }
}

/// Training hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    /// Number of training epochs
    pub epochs: usize,
    /// Batch size
    pub batch_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Adam first-moment decay
    pub beta_1: f32,
    /// Adam second-moment decay
    pub beta_2: f32,
    /// Adam numerical stability term
    pub epsilon: f32,
    /// Random seed for shuffling and weight initialisation
    pub seed: u64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: EPOCHS,
            batch_size: BATCH_SIZE,
            learning_rate: 1e-3,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-7,
            seed: 42,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Model artifact path (the recorder appends its own extension)
    pub model_path: PathBuf,
    /// Root under which each run gets a timestamped directory
    pub logs_root: PathBuf,
    /// Suffix appended to the run directory name
    pub run_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/simple_model/simple_model"),
            logs_root: PathBuf::from("logs"),
            run_name: "simple".to_string(),
        }
    }
}

/// Device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Index of the only GPU made visible to training
    pub gpu_index: usize,
    /// Whether a GPU should be used when one is available
    pub prefer_gpu: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            gpu_index: 0,
            prefer_gpu: true,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file, falling back to defaults for missing keys
    pub fn from_file(path: &Path) -> Result<Self> {
        load_toml_config(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.training.epochs == 0 {
            return Err(PipelineError::Config("epochs must be greater than 0".to_string()));
        }
        if self.training.batch_size == 0 {
            return Err(PipelineError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if !(self.training.learning_rate > 0.0) {
            return Err(PipelineError::Config(
                "learning_rate must be positive".to_string(),
            ));
        }
        if self.data.image_size < MIN_IMAGE_SIZE {
            return Err(PipelineError::Config(format!(
                "image_size must be at least {} for four conv/pool blocks, got {}",
                MIN_IMAGE_SIZE, self.data.image_size
            )));
        }
        Ok(())
    }

    /// Serialize to pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Serialization(format!("Failed to serialize config: {e}")))
    }
}

/// Read and parse a TOML configuration file
pub fn load_toml_config<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = fs::read_to_string(path)
        .map_err(|e| PipelineError::Config(format!("Failed to read config {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| PipelineError::Config(format!("Failed to parse config {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.training.epochs, 20);
        assert_eq!(config.training.batch_size, 64);
        assert_eq!(config.data.image_size, 100);
        assert!(config.data.shuffle_train);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.training.epochs = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.training.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.data.image_size = 32;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            "[training]\nepochs = 3\n\n[data]\ndata_dir = \"/tmp/leaves\"\n",
        )
        .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.training.epochs, 3);
        assert_eq!(config.training.batch_size, 64);
        assert_eq!(config.data.data_dir, PathBuf::from("/tmp/leaves"));
        assert_eq!(config.output.run_name, "simple");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: PipelineConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.training.seed, config.training.seed);
        assert_eq!(parsed.output.model_path, config.output.model_path);
    }

    #[test]
    fn test_missing_config_file() {
        let result = PipelineConfig::from_file(Path::new("/nonexistent/run.toml"));
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}

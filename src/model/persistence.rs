//! Saving and loading trained models
//!
//! A saved model is two files next to each other:
//! - `<stem>.mpk`: weights, named MessagePack at full precision
//! - `<stem>.config.json`: the [`SimpleCnnConfig`] needed to rebuild the topology
//!
//! The recorder replaces any extension of the given path, so `simpleModel.h5`
//! and `simpleModel` name the same artifact.

use std::path::{Path, PathBuf};

use burn::config::Config;
use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::backend::Backend;
use tracing::info;

use super::cnn::{SimpleCnn, SimpleCnnConfig};
use crate::utils::error::{PipelineError, Result};

/// Recorder used for model artifacts
pub type ModelRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Path of the weights file the recorder writes for `path`
pub fn weights_file(path: &Path) -> PathBuf {
    path.with_extension("mpk")
}

/// Path of the topology config written alongside the weights
pub fn config_file(path: &Path) -> PathBuf {
    path.with_extension("config.json")
}

/// Save model weights and topology config
pub fn save_model<B: Backend>(
    model: &SimpleCnn<B>,
    config: &SimpleCnnConfig,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    model.clone().save_file(path, &ModelRecorder::new())?;
    config.save(config_file(path))?;

    info!("Model saved to {:?}", weights_file(path));
    Ok(())
}

/// Rebuild a saved model on `device`
pub fn load_model<B: Backend>(path: &Path, device: &B::Device) -> Result<(SimpleCnn<B>, SimpleCnnConfig)> {
    let weights = weights_file(path);
    if !weights.exists() {
        return Err(PipelineError::PathNotFound(weights));
    }

    let config_path = config_file(path);
    let config = SimpleCnnConfig::load(&config_path).map_err(|e| {
        PipelineError::Model(format!("Failed to read model config {}: {e}", config_path.display()))
    })?;

    let model = config
        .init::<B>(device)
        .load_file(path, &ModelRecorder::new(), device)?;

    info!("Model loaded from {:?}", weights);
    Ok((model, config))
}

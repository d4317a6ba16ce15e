//! Inference Predictor Module
//!
//! Classifies individual images with a saved model, using the same
//! preprocessing as training (nearest-neighbour resize, 1/255 rescale).

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use burn::tensor::{backend::Backend, Tensor, TensorData};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::dataset::loader::is_image_file;
use crate::dataset::{class_name, LeafItem};
use crate::model::{load_model, SimpleCnn, SimpleCnnConfig};
use crate::utils::error::{PipelineError, Result};

/// Result of a single prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Path to the input image (if applicable)
    pub image_path: Option<PathBuf>,

    /// Predicted class index
    pub predicted_class: usize,

    /// Predicted class name
    pub class_name: String,

    /// Softmax probability of the predicted class
    pub confidence: f32,

    /// Top-k predictions with their probabilities
    pub top_k: Vec<(usize, String, f32)>,

    /// Inference time in milliseconds
    pub inference_time_ms: f64,
}

impl PredictionResult {
    /// Build a result from a probability distribution over classes
    pub fn new(probabilities: &[f32], k: usize, inference_time: Duration, image_path: Option<PathBuf>) -> Self {
        let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (predicted_class, confidence) = indexed.first().copied().unwrap_or((0, 0.0));
        let name = |idx: usize| class_name(idx).unwrap_or("Unknown").to_string();

        Self {
            image_path,
            predicted_class,
            class_name: name(predicted_class),
            confidence,
            top_k: indexed
                .iter()
                .take(k)
                .map(|&(idx, prob)| (idx, name(idx), prob))
                .collect(),
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        }
    }
}

/// A loaded model ready to classify images
pub struct Predictor<B: Backend> {
    model: SimpleCnn<B>,
    config: SimpleCnnConfig,
    device: B::Device,
    top_k: usize,
}

impl<B: Backend> Predictor<B> {
    pub fn new(model: SimpleCnn<B>, config: SimpleCnnConfig, device: B::Device) -> Self {
        Self {
            model,
            config,
            device,
            top_k: 5,
        }
    }

    /// Load a saved model (see [`crate::model::persistence`])
    pub fn load(model_path: &Path, device: B::Device) -> Result<Self> {
        let (model, config) = load_model::<B>(model_path, &device)?;
        Ok(Self::new(model, config, device))
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k.max(1);
        self
    }

    /// Classify a single image file
    pub fn predict_image(&self, path: &Path) -> Result<PredictionResult> {
        let size = self.config.image_size;
        let item = LeafItem::from_path(path, 0, size)?;

        let start = Instant::now();
        let input = Tensor::<B, 4>::from_floats(TensorData::new(item.image, [1, 3, size, size]), &self.device);
        let probabilities = self
            .model
            .forward_softmax(input)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| PipelineError::Model(format!("Failed to read probabilities: {e:?}")))?;

        Ok(PredictionResult::new(
            &probabilities,
            self.top_k,
            start.elapsed(),
            Some(path.to_path_buf()),
        ))
    }

    /// Classify one image, or every image under a directory (sorted by path)
    pub fn predict_path(&self, path: &Path) -> Result<Vec<PredictionResult>> {
        if path.is_file() {
            return Ok(vec![self.predict_image(path)?]);
        }
        if !path.is_dir() {
            return Err(PipelineError::PathNotFound(path.to_path_buf()));
        }

        WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_image_file(e.path()))
            .map(|e| self.predict_image(e.path()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::save_model;
    use burn_ndarray::NdArray;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    type TestBackend = NdArray;

    #[test]
    fn test_prediction_result_top_k() {
        let mut probs = vec![0.0f32; 16];
        probs[3] = 0.6;
        probs[15] = 0.3;
        probs[0] = 0.1;

        let result = PredictionResult::new(&probs, 2, Duration::from_millis(4), None);

        assert_eq!(result.predicted_class, 3);
        assert_eq!(result.class_name, "Grape___Esca_Black_Measles");
        assert_eq!(result.top_k.len(), 2);
        assert_eq!(result.top_k[1].0, 15);
        assert!((result.inference_time_ms - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_directory() {
        let dir = TempDir::new().unwrap();
        let device = Default::default();
        let config = SimpleCnnConfig::new().with_image_size(48);
        let model = config.init::<TestBackend>(&device);
        let model_path = dir.path().join("model");
        save_model(&model, &config, &model_path).unwrap();

        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        for name in ["a.png", "b.png"] {
            RgbImage::from_pixel(64, 64, Rgb([40, 160, 40])).save(images.join(name)).unwrap();
        }
        std::fs::write(images.join("readme.txt"), b"skip").unwrap();

        let predictor = Predictor::<TestBackend>::load(&model_path, device).unwrap().with_top_k(3);
        let results = predictor.predict_path(&images).unwrap();

        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(result.top_k.len(), 3);
            let total: f32 = result.top_k.iter().map(|t| t.2).sum();
            assert!(total <= 1.0 + 1e-4);
        }
        assert!(predictor.predict_path(&dir.path().join("missing")).is_err());
    }
}

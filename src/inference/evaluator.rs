//! Test-set evaluation
//!
//! Runs the model over every example of a split exactly once, in dataset
//! order, and turns the arg-max predictions into a confusion matrix and a
//! classification report.

use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::{LeafBatch, LeafBatcher, LeafDataset};
use crate::model::SimpleCnn;
use crate::training::loss::predicted_classes;
use crate::utils::batch_progress;
use crate::utils::error::{PipelineError, Result};
use crate::utils::metrics::{ClassificationReport, ConfusionMatrix};
use crate::NUM_CLASSES;

/// Predicted and true class per example, aligned by position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predictions {
    pub predicted: Vec<usize>,
    pub actual: Vec<usize>,
}

impl Predictions {
    pub fn len(&self) -> usize {
        self.predicted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicted.is_empty()
    }

    pub fn confusion_matrix(&self, num_classes: usize) -> ConfusionMatrix {
        ConfusionMatrix::from_predictions(&self.predicted, &self.actual, num_classes)
    }
}

/// Everything written to `evaluation.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub num_samples: usize,
    pub accuracy: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub report: ClassificationReport,
}

impl EvaluationReport {
    pub fn new(predictions: &Predictions, class_names: &[&str]) -> Self {
        let confusion_matrix = predictions.confusion_matrix(NUM_CLASSES);
        let report = ClassificationReport::new(&confusion_matrix, class_names);
        Self {
            num_samples: predictions.len(),
            accuracy: confusion_matrix.accuracy(),
            confusion_matrix,
            report,
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Batched, non-shuffled prediction over a dataset
pub struct Evaluator<B: Backend> {
    device: B::Device,
    batcher: LeafBatcher,
    batch_size: usize,
}

impl<B: Backend> Evaluator<B> {
    pub fn new(device: B::Device, image_size: usize, batch_size: usize) -> Self {
        Self {
            device,
            batcher: LeafBatcher::new(image_size, NUM_CLASSES),
            batch_size: batch_size.max(1),
        }
    }

    /// Predict every example of `dataset` once, in order
    pub fn predict(&self, model: &SimpleCnn<B>, dataset: &LeafDataset) -> Result<Predictions> {
        let len = dataset.len();
        let indices: Vec<usize> = (0..len).collect();
        let progress = batch_progress(len.div_ceil(self.batch_size));
        progress.set_message("predicting");

        let mut predictions = Predictions {
            predicted: Vec::with_capacity(len),
            actual: dataset.labels(),
        };

        for chunk in indices.chunks(self.batch_size) {
            let items = dataset.load_batch(chunk)?;
            let batch: LeafBatch<B> = self.batcher.batch(items, &self.device);

            let classes = predicted_classes(model.forward(batch.images))
                .into_data()
                .convert::<i64>()
                .to_vec::<i64>()
                .map_err(|e| PipelineError::Model(format!("Failed to read predictions: {e:?}")))?;
            predictions.predicted.extend(classes.into_iter().map(|c| c as usize));

            progress.inc(1);
        }
        progress.finish_and_clear();

        info!("Predicted {} examples", predictions.len());
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SimpleCnnConfig;
    use burn_ndarray::NdArray;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    type TestBackend = NdArray;

    #[test]
    fn test_every_example_predicted_once() {
        let dir = TempDir::new().unwrap();
        let samples: Vec<_> = (0..7)
            .map(|i| {
                let path = dir.path().join(format!("{i}.png"));
                RgbImage::from_pixel(48, 48, Rgb([i as u8 * 30, 90, 10])).save(&path).unwrap();
                (path, i % NUM_CLASSES)
            })
            .collect();
        let dataset = LeafDataset::new(samples, 48);

        let device = Default::default();
        let model = SimpleCnnConfig::new().with_image_size(48).init::<TestBackend>(&device);
        let evaluator = Evaluator::<TestBackend>::new(device, 48, 3);

        let predictions = evaluator.predict(&model, &dataset).unwrap();

        assert_eq!(predictions.len(), 7);
        assert_eq!(predictions.actual, vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(predictions.predicted.iter().all(|&p| p < NUM_CLASSES));

        let cm = predictions.confusion_matrix(NUM_CLASSES);
        assert_eq!(cm.dims(), (16, 16));
        assert_eq!(cm.total(), 7);
    }

    #[test]
    fn test_evaluation_report() {
        let predictions = Predictions {
            predicted: vec![0, 1, 1, 15],
            actual: vec![0, 1, 2, 15],
        };
        let names = crate::dataset::SHORT_NAMES;
        let report = EvaluationReport::new(&predictions, &names);

        assert_eq!(report.num_samples, 4);
        assert!((report.accuracy - 0.75).abs() < 1e-9);
        assert_eq!(report.confusion_matrix.total(), 4);
        assert_eq!(report.report.per_class.len(), NUM_CLASSES);
    }
}

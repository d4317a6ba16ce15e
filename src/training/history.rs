//! Per-epoch training history

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::Result;

/// Metric names in reporting order
pub const METRIC_NAMES: [&str; 4] = ["loss", "accuracy", "val_loss", "val_accuracy"];

/// Metrics of a single epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch number
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

/// Metric name → one value per completed epoch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub loss: Vec<f64>,
    pub accuracy: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub val_accuracy: Vec<f64>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one epoch to every metric
    pub fn record_epoch(&mut self, loss: f64, accuracy: f64, val_loss: f64, val_accuracy: f64) {
        self.loss.push(loss);
        self.accuracy.push(accuracy);
        self.val_loss.push(val_loss);
        self.val_accuracy.push(val_accuracy);
    }

    pub fn record(&mut self, metrics: &EpochMetrics) {
        self.record_epoch(metrics.loss, metrics.accuracy, metrics.val_loss, metrics.val_accuracy);
    }

    /// Number of recorded epochs
    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    /// Values of a metric by name
    pub fn metric(&self, name: &str) -> Option<&[f64]> {
        match name {
            "loss" => Some(&self.loss),
            "accuracy" => Some(&self.accuracy),
            "val_loss" => Some(&self.val_loss),
            "val_accuracy" => Some(&self.val_accuracy),
            _ => None,
        }
    }

    /// Highest validation accuracy and its 1-based epoch
    pub fn best_val_accuracy(&self) -> Option<(usize, f64)> {
        self.val_accuracy
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, acc)| match best {
                Some((_, b)) if b >= acc => best,
                _ => Some((i + 1, acc)),
            })
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_every_metric_grows_per_epoch() {
        let mut history = TrainingHistory::new();
        for epoch in 0..3 {
            history.record_epoch(1.0 / (epoch + 1) as f64, 0.5, 1.1, 0.4 + epoch as f64 * 0.1);
        }

        assert_eq!(history.epochs(), 3);
        for name in METRIC_NAMES {
            assert_eq!(history.metric(name).map(|v| v.len()), Some(3));
        }
        assert!(history.metric("lr").is_none());
    }

    #[test]
    fn test_best_val_accuracy() {
        let mut history = TrainingHistory::new();
        assert_eq!(history.best_val_accuracy(), None);

        history.record_epoch(1.0, 0.5, 1.0, 0.6);
        history.record_epoch(0.8, 0.6, 0.9, 0.7);
        history.record_epoch(0.7, 0.7, 1.0, 0.65);
        assert_eq!(history.best_val_accuracy(), Some((2, 0.7)));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        let mut history = TrainingHistory::new();
        history.record(&EpochMetrics {
            epoch: 1,
            loss: 2.5,
            accuracy: 0.25,
            val_loss: 2.4,
            val_accuracy: 0.3,
        });
        history.save_json(&path).unwrap();

        let loaded = TrainingHistory::load_json(&path).unwrap();
        assert_eq!(loaded, history);
    }
}

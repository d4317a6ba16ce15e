//! Metrics Module for Model Evaluation
//!
//! - Confusion matrix (rows = true class, columns = predicted class)
//! - Per-class precision, recall, F1-score and support
//! - Classification report with macro and weighted averages
//! - Running averages for per-epoch loss and accuracy

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Confusion Matrix for multi-class classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Number of classes
    pub num_classes: usize,

    /// Matrix data (row = actual, column = predicted)
    /// Stored as a flat vector in row-major order
    pub matrix: Vec<usize>,
}

impl Default for ConfusionMatrix {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ConfusionMatrix {
    /// Create a new empty confusion matrix
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            matrix: vec![0; num_classes * num_classes],
        }
    }

    /// Create confusion matrix from predictions and ground truth
    pub fn from_predictions(predictions: &[usize], ground_truth: &[usize], num_classes: usize) -> Self {
        let mut cm = Self::new(num_classes);

        for (&pred, &actual) in predictions.iter().zip(ground_truth.iter()) {
            cm.add(actual, pred);
        }

        cm
    }

    /// Add a single prediction to the matrix
    pub fn add(&mut self, actual: usize, predicted: usize) {
        if actual < self.num_classes && predicted < self.num_classes {
            let idx = actual * self.num_classes + predicted;
            self.matrix[idx] += 1;
        }
    }

    /// Get the count at (actual, predicted)
    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        if actual < self.num_classes && predicted < self.num_classes {
            self.matrix[actual * self.num_classes + predicted]
        } else {
            0
        }
    }

    /// Matrix dimensions (always square)
    pub fn dims(&self) -> (usize, usize) {
        (self.num_classes, self.num_classes)
    }

    /// Get the total count
    pub fn total(&self) -> usize {
        self.matrix.iter().sum()
    }

    /// Get the number of correct predictions (diagonal sum)
    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|i| self.get(i, i)).sum()
    }

    /// Get overall accuracy
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total > 0 {
            self.correct() as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Get the row sums (actual class counts)
    pub fn row_sums(&self) -> Vec<usize> {
        (0..self.num_classes)
            .map(|row| (0..self.num_classes).map(|col| self.get(row, col)).sum())
            .collect()
    }

    /// Get the column sums (predicted class counts)
    pub fn col_sums(&self) -> Vec<usize> {
        (0..self.num_classes)
            .map(|col| (0..self.num_classes).map(|row| self.get(row, col)).sum())
            .collect()
    }

    /// Largest single cell, used to scale heatmap colours
    pub fn max_count(&self) -> usize {
        self.matrix.iter().copied().max().unwrap_or(0)
    }

    /// Render the raw count table with optional row/column labels
    pub fn display(&self, class_names: Option<&[&str]>) -> String {
        let label = |idx: usize, width: usize| -> String {
            match class_names.and_then(|names| names.get(idx)) {
                Some(name) => name.chars().take(width).collect(),
                None => idx.to_string(),
            }
        };

        let mut output = String::new();
        output.push_str(&format!("{:>11}", ""));
        for col in 0..self.num_classes {
            output.push_str(&format!("{:>6}", label(col, 5)));
        }
        output.push('\n');

        for row in 0..self.num_classes {
            output.push_str(&format!("{:>10} ", label(row, 10)));
            for col in 0..self.num_classes {
                output.push_str(&format!("{:>6}", self.get(row, col)));
            }
            output.push('\n');
        }

        output
    }

    /// Save confusion matrix to CSV, using class names as headers when given
    pub fn save_csv(&self, path: &Path, class_names: &[&str]) -> crate::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec!["actual\\predicted".to_string()];
        header.extend((0..self.num_classes).map(|i| name_or_index(class_names, i)));
        writer.write_record(&header)?;

        for row in 0..self.num_classes {
            let mut record = vec![name_or_index(class_names, row)];
            record.extend((0..self.num_classes).map(|col| self.get(row, col).to_string()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn name_or_index(names: &[&str], idx: usize) -> String {
    names
        .get(idx)
        .map(|n| n.to_string())
        .unwrap_or_else(|| idx.to_string())
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display(None))
    }
}

/// Per-class metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// Class index
    pub class_idx: usize,

    /// Class name (if available)
    pub class_name: Option<String>,

    /// True positives
    pub true_positives: usize,

    /// False positives
    pub false_positives: usize,

    /// False negatives
    pub false_negatives: usize,

    /// Precision = TP / (TP + FP)
    pub precision: f64,

    /// Recall = TP / (TP + FN)
    pub recall: f64,

    /// F1 = 2 * (precision * recall) / (precision + recall)
    pub f1: f64,

    /// Support = number of actual samples of this class
    pub support: usize,
}

impl ClassMetrics {
    /// Calculate metrics for a class from confusion matrix
    pub fn from_confusion_matrix(cm: &ConfusionMatrix, class_idx: usize) -> Self {
        let true_positives = cm.get(class_idx, class_idx);

        // Predicted as this class but actually another
        let false_positives: usize = (0..cm.num_classes)
            .filter(|&i| i != class_idx)
            .map(|i| cm.get(i, class_idx))
            .sum();

        // Actually this class but predicted as another
        let false_negatives: usize = (0..cm.num_classes)
            .filter(|&i| i != class_idx)
            .map(|i| cm.get(class_idx, i))
            .sum();

        let support = true_positives + false_negatives;

        let precision = ratio(true_positives, true_positives + false_positives);
        let recall = ratio(true_positives, support);

        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            class_idx,
            class_name: None,
            true_positives,
            false_positives,
            false_negatives,
            precision,
            recall,
            f1,
            support,
        }
    }

    /// Set the class name
    pub fn with_name(mut self, name: &str) -> Self {
        self.class_name = Some(name.to_string());
        self
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

/// Averaged precision / recall / F1 row of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class precision/recall/F1 table with accuracy and averages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// One row per class, in class-index order
    pub per_class: Vec<ClassMetrics>,
    /// Overall accuracy
    pub accuracy: f64,
    /// Unweighted mean over classes
    pub macro_avg: AveragedMetrics,
    /// Mean over classes weighted by support
    pub weighted_avg: AveragedMetrics,
    /// Number of evaluated samples
    pub total_support: usize,
}

impl ClassificationReport {
    /// Build the report from a confusion matrix.
    ///
    /// Every class contributes to the macro average, including classes with
    /// no support (their scores are zero).
    pub fn new(cm: &ConfusionMatrix, class_names: &[&str]) -> Self {
        let per_class: Vec<ClassMetrics> = (0..cm.num_classes)
            .map(|idx| {
                let metrics = ClassMetrics::from_confusion_matrix(cm, idx);
                match class_names.get(idx) {
                    Some(name) => metrics.with_name(name),
                    None => metrics,
                }
            })
            .collect();

        let n = per_class.len().max(1) as f64;
        let macro_avg = AveragedMetrics {
            precision: per_class.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: per_class.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: per_class.iter().map(|m| m.f1).sum::<f64>() / n,
        };

        let total_support: usize = per_class.iter().map(|m| m.support).sum();
        let weighted = |value: fn(&ClassMetrics) -> f64| -> f64 {
            if total_support == 0 {
                return 0.0;
            }
            per_class
                .iter()
                .map(|m| value(m) * m.support as f64)
                .sum::<f64>()
                / total_support as f64
        };
        let weighted_avg = AveragedMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
        };

        Self {
            per_class,
            accuracy: cm.accuracy(),
            macro_avg,
            weighted_avg,
            total_support,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .per_class
            .iter()
            .filter_map(|m| m.class_name.as_ref().map(|n| n.len()))
            .max()
            .unwrap_or(0)
            .max("weighted avg".len());

        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for m in &self.per_class {
            let name = m
                .class_name
                .clone()
                .unwrap_or_else(|| m.class_idx.to_string());
            writeln!(
                f,
                "{:>width$} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.total_support
        )?;
        for (label, avg) in [("macro avg", self.macro_avg), ("weighted avg", self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, avg.precision, avg.recall, avg.f1, self.total_support
            )?;
        }

        Ok(())
    }
}

/// Running average for tracking metrics during training
#[derive(Debug, Clone, Default)]
pub struct RunningAverage {
    sum: f64,
    count: usize,
}

impl RunningAverage {
    /// Create a new running average
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value with weight 1
    pub fn add(&mut self, value: f64) {
        self.add_weighted(value, 1);
    }

    /// Add a batch mean covering `weight` samples
    pub fn add_weighted(&mut self, value: f64, weight: usize) {
        self.sum += value * weight as f64;
        self.count += weight;
    }

    /// Get the current average
    pub fn average(&self) -> f64 {
        if self.count > 0 {
            self.sum / self.count as f64
        } else {
            0.0
        }
    }

    /// Get the count
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Accuracy tracker for training
#[derive(Debug, Clone, Default)]
pub struct AccuracyTracker {
    correct: usize,
    total: usize,
}

impl AccuracyTracker {
    /// Create a new accuracy tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the number of correct predictions out of a batch
    pub fn add_counts(&mut self, correct: usize, total: usize) {
        self.correct += correct;
        self.total += total;
    }

    /// Get the current accuracy
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    /// Get the count
    pub fn count(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> ConfusionMatrix {
        // (pred, gt): 7 of 10 correct
        let predictions = vec![0, 1, 2, 0, 1, 2, 0, 0, 2, 2];
        let ground_truth = vec![0, 1, 2, 0, 2, 2, 1, 0, 1, 2];
        ConfusionMatrix::from_predictions(&predictions, &ground_truth, 3)
    }

    #[test]
    fn test_confusion_matrix() {
        let cm = sample_matrix();

        assert_eq!(cm.get(0, 0), 3);
        assert_eq!(cm.get(1, 1), 1);
        assert_eq!(cm.get(2, 2), 3);
        assert_eq!(cm.get(1, 0), 1);

        assert_eq!(cm.total(), 10);
        assert_eq!(cm.correct(), 7);
        assert!((cm.accuracy() - 0.7).abs() < 1e-9);
        assert_eq!(cm.row_sums(), vec![3, 3, 4]);
        assert_eq!(cm.col_sums(), vec![4, 2, 4]);
    }

    #[test]
    fn test_sixteen_class_matrix_counts_every_sample() {
        let ground_truth: Vec<usize> = (0..100).map(|i| i % 16).collect();
        let predictions: Vec<usize> = (0..100).map(|i| (i * 7) % 16).collect();

        let cm = ConfusionMatrix::from_predictions(&predictions, &ground_truth, 16);

        assert_eq!(cm.dims(), (16, 16));
        assert_eq!(cm.matrix.len(), 256);
        assert_eq!(cm.total(), 100);
    }

    #[test]
    fn test_out_of_range_labels_ignored() {
        let mut cm = ConfusionMatrix::new(2);
        cm.add(0, 5);
        cm.add(3, 1);
        assert_eq!(cm.total(), 0);
        assert_eq!(cm.get(9, 9), 0);
    }

    #[test]
    fn test_class_metrics() {
        let predictions = vec![0, 0, 0, 1, 1];
        let ground_truth = vec![0, 0, 1, 1, 0];

        let cm = ConfusionMatrix::from_predictions(&predictions, &ground_truth, 2);
        let class0 = ClassMetrics::from_confusion_matrix(&cm, 0);

        // Class 0: TP=2, FP=1, FN=1
        assert_eq!(class0.true_positives, 2);
        assert_eq!(class0.false_positives, 1);
        assert_eq!(class0.false_negatives, 1);
        assert_eq!(class0.support, 3);
        assert!((class0.precision - 2.0 / 3.0).abs() < 1e-9);
        assert!((class0.recall - 2.0 / 3.0).abs() < 1e-9);
        assert!((class0.f1 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_classification_report_averages() {
        let cm = sample_matrix();
        let report = ClassificationReport::new(&cm, &["a", "b", "c"]);

        // class a: P=3/4 R=3/3; class b: P=1/2 R=1/3; class c: P=3/4 R=3/4
        let a = &report.per_class[0];
        assert!((a.precision - 0.75).abs() < 1e-9);
        assert!((a.recall - 1.0).abs() < 1e-9);
        assert_eq!(a.class_name.as_deref(), Some("a"));

        let expected_macro_recall = (1.0 + 1.0 / 3.0 + 0.75) / 3.0;
        assert!((report.macro_avg.recall - expected_macro_recall).abs() < 1e-9);

        // Weighted recall equals accuracy
        assert!((report.weighted_avg.recall - 0.7).abs() < 1e-9);
        assert_eq!(report.total_support, 10);
    }

    #[test]
    fn test_report_rendering() {
        let report = ClassificationReport::new(&sample_matrix(), &["Ch_healthy", "Ch_PM", "Gr_BlRt"]);
        let text = report.to_string();

        assert!(text.contains("precision"));
        assert!(text.contains("Ch_PM"));
        assert!(text.contains("macro avg"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("0.70"));
    }

    #[test]
    fn test_zero_support_class() {
        let cm = ConfusionMatrix::from_predictions(&[0, 0], &[0, 0], 2);
        let report = ClassificationReport::new(&cm, &[]);
        assert_eq!(report.per_class[1].support, 0);
        assert_eq!(report.per_class[1].f1, 0.0);
        assert!((report.macro_avg.f1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_save_csv() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cm.csv");
        sample_matrix().save_csv(&path, &["a", "b", "c"]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("actual\\predicted,a,b,c"));
        assert_eq!(lines.next(), Some("a,3,0,0"));
    }

    #[test]
    fn test_running_average_weighted() {
        let mut avg = RunningAverage::new();
        avg.add_weighted(1.0, 3);
        avg.add_weighted(3.0, 1);

        assert_eq!(avg.count(), 4);
        assert!((avg.average() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_tracker() {
        let mut tracker = AccuracyTracker::new();
        tracker.add_counts(2, 3);
        tracker.add_counts(1, 1);

        assert_eq!(tracker.count(), 4);
        assert!((tracker.accuracy() - 0.75).abs() < 1e-9);
    }
}

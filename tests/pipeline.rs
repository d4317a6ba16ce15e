//! End-to-end run on a tiny synthetic 16-class dataset

use std::path::Path;

use burn::backend::Autodiff;
use burn_ndarray::NdArray;
use image::{Rgb, RgbImage};
use tempfile::TempDir;

use plantvillage_cnn::config::PipelineConfig;
use plantvillage_cnn::dataset::{SplitKind, CLASS_NAMES};
use plantvillage_cnn::model::persistence::{config_file, weights_file};
use plantvillage_cnn::pipeline::{evaluate_saved_model, run_pipeline};
use plantvillage_cnn::NUM_CLASSES;

const IMAGE_SIZE: usize = 48;

fn write_split(data_dir: &Path, kind: SplitKind, per_class: usize) {
    for (label, class) in CLASS_NAMES.iter().enumerate() {
        let dir = data_dir.join(kind.dir_name()).join(class);
        std::fs::create_dir_all(&dir).unwrap();
        for i in 0..per_class {
            let red = (label * 16) as u8;
            let green = (i * 40) as u8;
            RgbImage::from_pixel(64, 64, Rgb([red, green, 200 - red / 2]))
                .save(dir.join(format!("leaf_{i}.png")))
                .unwrap();
        }
    }
}

fn test_config(root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.data.data_dir = root.join("data");
    config.data.image_size = IMAGE_SIZE;
    config.training.epochs = 2;
    config.training.batch_size = 8;
    config.output.logs_root = root.join("logs");
    config.output.model_path = root.join("models").join("simple_model");
    config
}

#[test]
fn full_pipeline_trains_saves_and_reports() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());

    write_split(&config.data.data_dir, SplitKind::Train, 2);
    write_split(&config.data.data_dir, SplitKind::Validation, 1);
    write_split(&config.data.data_dir, SplitKind::Test, 1);
    // Counted by enumeration but not loadable: the training batches wrap around
    std::fs::write(
        config.data.data_dir.join("train").join(CLASS_NAMES[0]).join("Thumbs.db"),
        b"",
    )
    .unwrap();

    let device = Default::default();
    let outcome = run_pipeline::<Autodiff<NdArray>>(&config, &device).unwrap();

    let train_summary = &outcome.splits[0];
    assert_eq!(train_summary.kind, SplitKind::Train);
    assert_eq!(train_summary.total_files, 2 * NUM_CLASSES + 1);
    assert_eq!(
        train_summary.total_files,
        train_summary.directories.iter().map(|d| d.files).sum::<usize>()
    );

    assert_eq!(outcome.history.epochs(), 2);
    assert_eq!(outcome.history.loss.len(), 2);
    assert_eq!(outcome.history.val_accuracy.len(), 2);

    assert!(weights_file(&config.output.model_path).exists());
    assert!(config_file(&config.output.model_path).exists());

    let cm = &outcome.evaluation.confusion_matrix;
    assert_eq!(cm.dims(), (NUM_CLASSES, NUM_CLASSES));
    assert_eq!(cm.total(), NUM_CLASSES);
    assert_eq!(outcome.evaluation.num_samples, NUM_CLASSES);
    assert_eq!(outcome.evaluation.report.per_class.len(), NUM_CLASSES);

    for artifact in [
        "config.toml",
        "metrics.csv",
        "history.json",
        "loss.svg",
        "accuracy.svg",
        "confusion_matrix.svg",
        "confusion_matrix.csv",
        "classification_report.txt",
        "evaluation.json",
    ] {
        assert!(outcome.run_dir.join(artifact).exists(), "missing {artifact}");
    }

    let metrics = std::fs::read_to_string(outcome.run_dir.join("metrics.csv")).unwrap();
    assert_eq!(metrics.lines().count(), 1 + 2);

    // The saved model reproduces the in-run evaluation
    let (_, reloaded) = evaluate_saved_model::<NdArray>(&config, &device).unwrap();
    assert_eq!(reloaded.confusion_matrix, outcome.evaluation.confusion_matrix);
}

#[test]
fn missing_split_fails_the_run() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());
    write_split(&config.data.data_dir, SplitKind::Train, 1);

    let result = run_pipeline::<Autodiff<NdArray>>(&config, &Default::default());
    assert!(result.is_err());
}

//! End-to-end run: enumerate → load → build → train → save → evaluate → report
//!
//! The stages run strictly in sequence. Any stage failure ends the run with
//! an error; only device selection (see [`crate::backend`]) degrades
//! gracefully.

use std::path::{Path, PathBuf};

use burn::module::AutodiffModule;
use burn::tensor::backend::{AutodiffBackend, Backend};
use colored::Colorize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::dataset::{
    enumerate_split, steps_per_epoch, ImageFolder, LeafDataset, SplitKind, SplitSummary,
    CLASS_NAMES, SHORT_NAMES,
};
use crate::inference::{EvaluationReport, Evaluator};
use crate::model::{load_model, save_model, ModelSummary, SimpleCnn, SimpleCnnConfig};
use crate::training::{new_run_dir, RunLog, Trainer, TrainingHistory};
use crate::utils::charts::{generate_confusion_heatmap, generate_learning_curves};
use crate::utils::error::{PipelineError, Result};

pub const HISTORY_FILE: &str = "history.json";
pub const CONFUSION_CSV_FILE: &str = "confusion_matrix.csv";
pub const CONFUSION_SVG_FILE: &str = "confusion_matrix.svg";
pub const REPORT_FILE: &str = "classification_report.txt";
pub const EVALUATION_FILE: &str = "evaluation.json";

/// Result of a full training run
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Timestamped directory holding every artifact of the run
    pub run_dir: PathBuf,
    /// Base path of the saved model
    pub model_path: PathBuf,
    pub splits: Vec<SplitSummary>,
    pub history: TrainingHistory,
    pub evaluation: EvaluationReport,
}

/// Enumerate and print every split under the data root
pub fn enumerate_dataset(data_dir: &Path) -> Result<Vec<SplitSummary>> {
    println!("{}", "Dataset Overview:".cyan().bold());
    SplitKind::ALL
        .iter()
        .map(|&kind| {
            let summary = enumerate_split(data_dir, kind)?;
            summary.print();
            Ok(summary)
        })
        .collect()
}

fn split_total(splits: &[SplitSummary], kind: SplitKind) -> usize {
    splits
        .iter()
        .find(|s| s.kind == kind)
        .map(|s| s.total_files)
        .unwrap_or(0)
}

fn load_split(config: &PipelineConfig, kind: SplitKind) -> Result<LeafDataset> {
    let folder = ImageFolder::open(&config.data.data_dir, kind)?;
    println!(
        "  Found {} images belonging to {} classes ({}).",
        folder.len(),
        folder.num_classes(),
        kind
    );
    Ok(LeafDataset::from_folder(&folder, config.data.image_size))
}

/// Print and persist the evaluation results into `output_dir`
pub fn write_reports(evaluation: &EvaluationReport, output_dir: &Path) -> Result<()> {
    println!();
    println!("{}", "Confusion Matrix:".cyan().bold());
    print!("{}", evaluation.confusion_matrix.display(Some(&SHORT_NAMES[..])));
    println!();
    println!("{}", "Classification Report:".cyan().bold());
    println!("{}", evaluation.report);

    evaluation
        .confusion_matrix
        .save_csv(&output_dir.join(CONFUSION_CSV_FILE), &CLASS_NAMES)?;
    std::fs::write(output_dir.join(REPORT_FILE), evaluation.report.to_string())?;
    evaluation.save_json(&output_dir.join(EVALUATION_FILE))?;
    generate_confusion_heatmap(
        "Confusion matrix",
        &evaluation.confusion_matrix,
        &SHORT_NAMES,
        &output_dir.join(CONFUSION_SVG_FILE),
    )?;

    info!("Reports written to {}", output_dir.display());
    Ok(())
}

/// Predict the whole test split once and build the report
pub fn evaluate_model<B: Backend>(
    model: &SimpleCnn<B>,
    config: &PipelineConfig,
    device: &B::Device,
) -> Result<EvaluationReport> {
    println!();
    println!("{}", "Evaluating on test split...".cyan().bold());
    let test = load_split(config, SplitKind::Test)?;

    let evaluator = Evaluator::<B>::new(device.clone(), config.data.image_size, config.training.batch_size);
    let predictions = evaluator.predict(model, &test)?;
    Ok(EvaluationReport::new(&predictions, &CLASS_NAMES))
}

/// Train, save, evaluate and report
pub fn run_pipeline<B: AutodiffBackend>(config: &PipelineConfig, device: &B::Device) -> Result<PipelineOutcome> {
    config.validate()?;
    let batch_size = config.training.batch_size;

    let splits = enumerate_dataset(&config.data.data_dir)?;
    let train_steps = steps_per_epoch(split_total(&splits, SplitKind::Train), batch_size);
    let val_steps = steps_per_epoch(split_total(&splits, SplitKind::Validation), batch_size);

    println!();
    println!("{}", "Loading Dataset...".cyan().bold());
    let train = load_split(config, SplitKind::Train)?;
    let val = load_split(config, SplitKind::Validation)?;

    let model_config = SimpleCnnConfig::new().with_image_size(config.data.image_size);
    println!();
    println!("{}", "Model Summary:".cyan().bold());
    println!("{}", ModelSummary::from_config(&model_config));
    let model = model_config.init::<B>(device);

    let run_log = RunLog::create(&config.output.logs_root, &config.output.run_name)?;
    run_log.write_config(config)?;
    let run_dir = run_log.dir().to_path_buf();

    println!();
    let mut trainer = Trainer::<B>::new(config.training.clone(), config.data.image_size, device.clone())
        .with_steps(train_steps, val_steps)
        .with_shuffle(config.data.shuffle_train)
        .with_run_log(run_log);
    let (model, history) = trainer.fit(model, &train, &val)?;

    println!();
    println!("{}", "Saving Model...".cyan());
    save_model(&model, &model_config, &config.output.model_path)?;
    println!("  💾 Saved to: {:?}", config.output.model_path);

    history.save_json(&run_dir.join(HISTORY_FILE))?;
    generate_learning_curves(&history, &run_dir)?;

    let evaluation = evaluate_model(&model.valid(), config, device)?;
    write_reports(&evaluation, &run_dir)?;

    println!();
    println!("{}", "Training Complete!".green().bold());
    println!("  📁 Run directory: {}", run_dir.display());
    println!("  🎯 Test accuracy: {:.2}%", evaluation.accuracy * 100.0);

    Ok(PipelineOutcome {
        run_dir,
        model_path: config.output.model_path.clone(),
        splits,
        history,
        evaluation,
    })
}

/// Evaluate a previously saved model on the test split
///
/// Reports go into a fresh `<logs_root>/<timestamp>-evaluate/` directory.
pub fn evaluate_saved_model<B: Backend>(
    config: &PipelineConfig,
    device: &B::Device,
) -> Result<(PathBuf, EvaluationReport)> {
    config.validate()?;
    let (model, model_config) = load_model::<B>(&config.output.model_path, device)?;
    if model_config.image_size != config.data.image_size {
        return Err(PipelineError::Config(format!(
            "Model expects {}px images but data.image_size is {}",
            model_config.image_size, config.data.image_size
        )));
    }

    let evaluation = evaluate_model(&model, config, device)?;
    let output_dir = new_run_dir(&config.output.logs_root, "evaluate")?;
    write_reports(&evaluation, &output_dir)?;
    Ok((output_dir, evaluation))
}

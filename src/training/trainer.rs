//! Supervised training loop
//!
//! A hand-written loop over Burn's optimizer API rather than the high-level
//! `LearnerBuilder`: each epoch runs a fixed number of optimizer steps over
//! the (reshuffled) training split, then a fixed number of validation batches
//! on the non-autodiff inner backend.

use std::time::Instant;

use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
};
use colored::Colorize;
use tracing::{debug, info};

use super::history::{EpochMetrics, TrainingHistory};
use super::loss::{categorical_cross_entropy, count_correct};
use super::run_log::RunLog;
use crate::config::TrainingParams;
use crate::dataset::{steps_per_epoch, EpochSampler, LeafBatch, LeafBatcher, LeafDataset};
use crate::model::SimpleCnn;
use crate::utils::error::{PipelineError, Result};
use crate::utils::metrics::{AccuracyTracker, RunningAverage};
use crate::utils::{batch_progress, format_duration};
use crate::NUM_CLASSES;

/// Trains a [`SimpleCnn`] with Adam on an autodiff backend
pub struct Trainer<B: AutodiffBackend> {
    params: TrainingParams,
    device: B::Device,
    batcher: LeafBatcher,
    steps: Option<(usize, usize)>,
    shuffle_train: bool,
    run_log: Option<RunLog>,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(params: TrainingParams, image_size: usize, device: B::Device) -> Self {
        Self {
            params,
            device,
            batcher: LeafBatcher::new(image_size, NUM_CLASSES),
            steps: None,
            shuffle_train: true,
            run_log: None,
        }
    }

    /// Fix the number of training and validation batches per epoch
    ///
    /// Without this, both are derived from the dataset lengths.
    pub fn with_steps(mut self, train_steps: usize, val_steps: usize) -> Self {
        self.steps = Some((train_steps, val_steps));
        self
    }

    pub fn with_shuffle(mut self, shuffle_train: bool) -> Self {
        self.shuffle_train = shuffle_train;
        self
    }

    /// Append every epoch's metrics to this run log
    pub fn with_run_log(mut self, run_log: RunLog) -> Self {
        self.run_log = Some(run_log);
        self
    }

    pub fn run_log(&self) -> Option<&RunLog> {
        self.run_log.as_ref()
    }

    /// Train for the configured number of epochs
    ///
    /// Returns the trained model and one history entry per epoch and metric.
    pub fn fit(
        &mut self,
        mut model: SimpleCnn<B>,
        train: &LeafDataset,
        val: &LeafDataset,
    ) -> Result<(SimpleCnn<B>, TrainingHistory)> {
        use burn::data::dataset::Dataset;

        if train.is_empty() || val.is_empty() {
            return Err(PipelineError::Training(format!(
                "Cannot train with {} training and {} validation samples",
                train.len(),
                val.len()
            )));
        }

        let batch_size = self.params.batch_size;
        let epochs = self.params.epochs;
        let (train_steps, val_steps) = self.steps.unwrap_or_else(|| {
            (
                steps_per_epoch(train.len(), batch_size),
                steps_per_epoch(val.len(), batch_size),
            )
        });

        let mut train_sampler =
            EpochSampler::new(train.len(), batch_size, train_steps, self.shuffle_train, self.params.seed);
        let val_batches = EpochSampler::new(val.len(), batch_size, val_steps, false, self.params.seed).next_epoch();

        let mut optimizer = AdamConfig::new()
            .with_beta_1(self.params.beta_1)
            .with_beta_2(self.params.beta_2)
            .with_epsilon(self.params.epsilon)
            .init();

        println!("{}", "Training Configuration:".cyan().bold());
        println!("  🔄 Epochs:            {}", epochs);
        println!("  📦 Batch size:        {}", batch_size);
        println!("  📈 Learning rate:     {}", self.params.learning_rate);
        println!("  🏷️  Steps per epoch:   {}", train_steps);
        println!("  ✅ Validation steps:  {}", val_steps);
        println!();
        println!("{}", "Starting Training...".green().bold());
        info!(
            "Training {} epochs: {} steps/epoch, {} validation steps",
            epochs, train_steps, val_steps
        );

        let mut history = TrainingHistory::new();

        for epoch in 1..=epochs {
            let started = Instant::now();
            let batches = train_sampler.next_epoch();

            let progress = batch_progress(batches.len());
            progress.set_message(format!("epoch {epoch}/{epochs}"));

            let mut loss_avg = RunningAverage::new();
            let mut accuracy = AccuracyTracker::new();

            for indices in &batches {
                let items = train.load_batch(indices)?;
                let batch: LeafBatch<B> = self.batcher.batch(items, &self.device);
                let n = batch.labels.dims()[0];

                let logits = model.forward(batch.images);
                let loss = categorical_cross_entropy(logits.clone(), batch.targets);

                let loss_value: f64 = loss.clone().into_scalar().elem();
                if !loss_value.is_finite() {
                    progress.abandon();
                    return Err(PipelineError::Training(format!(
                        "Loss became {loss_value} in epoch {epoch}"
                    )));
                }
                loss_avg.add_weighted(loss_value, n);
                accuracy.add_counts(count_correct(logits, batch.labels), n);

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optimizer.step(self.params.learning_rate, model, grads);

                progress.inc(1);
            }
            progress.finish_and_clear();

            let (val_loss, val_accuracy) =
                evaluate_batches(&model.valid(), val, &self.batcher, &val_batches, &self.device)?;

            let metrics = EpochMetrics {
                epoch,
                loss: loss_avg.average(),
                accuracy: accuracy.accuracy(),
                val_loss,
                val_accuracy,
            };
            history.record(&metrics);

            if let Some(run_log) = self.run_log.as_mut() {
                run_log.append(&metrics)?;
            }

            println!(
                "{} - {} - loss: {:.4} - accuracy: {:.4} - val_loss: {:.4} - val_accuracy: {:.4}",
                format!("Epoch {epoch}/{epochs}").yellow().bold(),
                format_duration(started.elapsed().as_secs_f64()),
                metrics.loss,
                metrics.accuracy,
                metrics.val_loss,
                metrics.val_accuracy
            );
            debug!("{:?}", metrics);
        }

        if let Some((best_epoch, best)) = history.best_val_accuracy() {
            info!("Best validation accuracy {:.4} at epoch {}", best, best_epoch);
        }

        Ok((model, history))
    }
}

/// Mean loss and accuracy of `model` over the given batches
pub fn evaluate_batches<B: Backend>(
    model: &SimpleCnn<B>,
    dataset: &LeafDataset,
    batcher: &LeafBatcher,
    batches: &[Vec<usize>],
    device: &B::Device,
) -> Result<(f64, f64)> {
    let mut loss_avg = RunningAverage::new();
    let mut accuracy = AccuracyTracker::new();

    for indices in batches {
        let items = dataset.load_batch(indices)?;
        let batch: LeafBatch<B> = batcher.batch(items, device);
        let n = batch.labels.dims()[0];

        let logits = model.forward(batch.images);
        let loss: f64 = categorical_cross_entropy(logits.clone(), batch.targets)
            .into_scalar()
            .elem();

        loss_avg.add_weighted(loss, n);
        accuracy.add_counts(count_correct(logits, batch.labels), n);
    }

    Ok((loss_avg.average(), accuracy.accuracy()))
}

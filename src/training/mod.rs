//! Training module
//!
//! - `loss`: categorical cross-entropy on logits and accuracy counting
//! - `history`: per-epoch metric history
//! - `run_log`: timestamped run directory with a per-epoch metrics CSV
//! - `trainer`: the supervised Adam training loop

pub mod history;
pub mod loss;
pub mod run_log;
pub mod trainer;

pub use history::{EpochMetrics, TrainingHistory};
pub use run_log::{new_run_dir, RunLog};
pub use trainer::Trainer;

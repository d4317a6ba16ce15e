//! # PlantVillage CNN
//!
//! Trains a small convolutional network on PlantVillage leaf images (16 disease
//! classes of cherry, grape and tomato), evaluates it on a held-out split and
//! renders diagnostic reports. Built on the Burn framework.
//!
//! ## Modules
//!
//! - `dataset`: Split enumeration, image-folder loading and batching
//! - `model`: The fixed-topology CNN and its layer summary
//! - `training`: Training loop, loss, history and on-disk run log
//! - `inference`: Test-set prediction and single-image inference
//! - `pipeline`: The end-to-end train → save → evaluate → report run
//! - `utils`: Errors, logging, metrics and SVG charts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plantvillage_cnn::backend::{select_device, TrainingBackend};
//! use plantvillage_cnn::config::PipelineConfig;
//! use plantvillage_cnn::pipeline::run_pipeline;
//!
//! let config = PipelineConfig::default();
//! let device = select_device(&config.device);
//! let outcome = run_pipeline::<TrainingBackend>(&config, &device)?;
//! println!("{}", outcome.evaluation.report);
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod pipeline;
pub mod training;
pub mod utils;

pub use config::PipelineConfig;
pub use dataset::{LeafBatch, LeafBatcher, LeafDataset, LeafItem, SplitKind, SplitSummary};
pub use model::cnn::{SimpleCnn, SimpleCnnConfig};
pub use training::{Trainer, TrainingHistory};
pub use utils::error::{PipelineError, Result};
pub use utils::metrics::{ClassificationReport, ConfusionMatrix};

/// Number of disease classes in the leaf vocabulary
pub const NUM_CLASSES: usize = 16;

/// Side length of the square RGB input images
pub const IMAGE_SIZE: usize = 100;

/// Number of training epochs
pub const EPOCHS: usize = 20;

/// Mini-batch size for training, validation and test iteration
pub const BATCH_SIZE: usize = 64;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

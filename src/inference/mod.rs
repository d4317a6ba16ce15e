//! Inference module for model prediction
//!
//! This module provides:
//! - Ordered prediction over a whole split for evaluation
//! - Single image and directory prediction with a saved model

pub mod evaluator;
pub mod predictor;

// Re-export main types for convenience
pub use evaluator::{EvaluationReport, Evaluator, Predictions};
pub use predictor::{PredictionResult, Predictor};

//! Model module for the leaf classifier using the Burn framework
//!
//! This module provides:
//! - The fixed-topology CNN and its configuration
//! - A Keras-style layer summary
//! - Model serialization and loading utilities

pub mod cnn;
pub mod persistence;
pub mod summary;

// Re-export main types for convenience
pub use cnn::{SimpleCnn, SimpleCnnConfig};
pub use persistence::{load_model, save_model};
pub use summary::ModelSummary;

//! Error Handling Module
//!
//! Defines the error type for the training pipeline.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error loading or decoding an image
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error with dataset layout or contents
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Error with model construction or shapes
    #[error("Model error: {0}")]
    Model(String),

    /// Error during the training loop
    #[error("Training error: {0}")]
    Training(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failure writing the CSV run log
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Failure saving or loading model weights
    #[error("Record error: {0}")]
    Record(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<burn::record::RecorderError> for PipelineError {
    fn from(err: burn::record::RecorderError) -> Self {
        PipelineError::Record(format!("{err:?}"))
    }
}

/// Convenience Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::Dataset("split is empty".to_string());
        assert_eq!(format!("{}", err), "Dataset error: split is empty");
    }

    #[test]
    fn test_image_load_error() {
        let path = PathBuf::from("/data/train/Tomato___healthy/leaf.jpg");
        let err = PipelineError::ImageLoad(path, "corrupt header".to_string());
        let text = format!("{}", err);
        assert!(text.contains("leaf.jpg"));
        assert!(text.contains("corrupt header"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}

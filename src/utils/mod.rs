//! Utilities module for logging, metrics, charts, and helper functions
//!
//! This module provides:
//! - Structured logging with tracing
//! - Metrics computation (confusion matrix, classification report)
//! - SVG learning curves and confusion heatmap
//! - Error handling types

pub mod charts;
pub mod error;
pub mod logging;
pub mod metrics;

use indicatif::{ProgressBar, ProgressStyle};

// Re-export main types for convenience
pub use error::{PipelineError, Result};
pub use logging::init_logging;
pub use metrics::{ClassificationReport, ConfusionMatrix};

/// Progress bar over `len` batches
pub fn batch_progress(len: usize) -> ProgressBar {
    let progress = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("  [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    progress.set_style(style);
    progress
}

/// Format a duration in a human-readable way
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        let minutes = (seconds / 60.0).floor();
        let secs = seconds % 60.0;
        format!("{}m {:.0}s", minutes as u32, secs)
    } else {
        let hours = (seconds / 3600.0).floor();
        let minutes = ((seconds % 3600.0) / 60.0).floor();
        format!("{}h {}m", hours as u32, minutes as u32)
    }
}

/// Format a number with thousands separator
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.5), "30.5s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1_298_128), "1,298,128");
        assert_eq!(format_number(16888), "16,888");
        assert_eq!(format_number(42), "42");
    }
}

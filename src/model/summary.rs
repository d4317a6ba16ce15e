//! Layer-by-layer model summary
//!
//! Computed from the configuration alone, so it can be printed without
//! allocating the model.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::cnn::{SimpleCnnConfig, CONV_FILTERS, HIDDEN_UNITS};
use crate::utils::format_number;

/// One row of the summary table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub name: String,
    pub kind: String,
    /// Output shape without the batch dimension
    pub output_shape: Vec<usize>,
    pub params: usize,
}

/// Summary table of the SimpleCnn topology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub layers: Vec<LayerSummary>,
}

impl ModelSummary {
    pub fn from_config(config: &SimpleCnnConfig) -> Self {
        let mut layers = Vec::new();
        let mut push = |name: String, kind: &str, output_shape: Vec<usize>, params: usize| {
            layers.push(LayerSummary {
                name,
                kind: kind.to_string(),
                output_shape,
                params,
            })
        };

        let mut channels = config.in_channels;
        let mut size = config.image_size;
        for (i, &filters) in CONV_FILTERS.iter().enumerate() {
            size = size.saturating_sub(2);
            push(
                format!("conv{}", i + 1),
                "Conv2d",
                vec![filters, size, size],
                (channels * 9 + 1) * filters,
            );
            size /= 2;
            push(format!("pool{}", i + 1), "MaxPool2d", vec![filters, size, size], 0);
            channels = filters;
        }

        let flat = channels * size * size;
        push("flatten".to_string(), "Flatten", vec![flat], 0);
        push("fc1".to_string(), "Linear", vec![HIDDEN_UNITS], (flat + 1) * HIDDEN_UNITS);
        push(
            "fc2".to_string(),
            "Linear",
            vec![config.num_classes],
            (HIDDEN_UNITS + 1) * config.num_classes,
        );

        Self { layers }
    }

    /// Total trainable parameters
    pub fn total_params(&self) -> usize {
        self.layers.iter().map(|l| l.params).sum()
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "─".repeat(66);
        writeln!(f, "{rule}")?;
        writeln!(f, "{:<28}{:<26}{:>12}", "Layer (type)", "Output Shape", "Param #")?;
        writeln!(f, "{}", "═".repeat(66))?;
        for layer in &self.layers {
            let dims: Vec<String> = layer.output_shape.iter().map(|d| d.to_string()).collect();
            writeln!(
                f,
                "{:<28}{:<26}{:>12}",
                format!("{} ({})", layer.name, layer.kind),
                format!("(None, {})", dims.join(", ")),
                format_number(layer.params)
            )?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f, "Total params: {}", format_number(self.total_params()))?;
        writeln!(f, "Trainable params: {}", format_number(self.total_params()))?;
        write!(f, "{rule}")
    }
}

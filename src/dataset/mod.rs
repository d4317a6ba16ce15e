//! Dataset module for PlantVillage data handling
//!
//! This module provides functionality for:
//! - Enumerating the `train/`, `validation/` and `test/` splits on disk
//! - Loading a split as an image folder (one subdirectory per class)
//! - Burn `Dataset`/`Batcher` integration with one-hot targets
//!
//! ## Class indices
//!
//! A class index is the position of its directory name in the sorted list of
//! class directories. The sorted names must equal [`CLASS_NAMES`]; any other
//! set of class directories is rejected when a split is loaded.

pub mod burn_dataset;
pub mod enumerate;
pub mod loader;

// Re-export main types for convenience
pub use burn_dataset::{EpochSampler, LeafBatch, LeafBatcher, LeafDataset, LeafItem};
pub use enumerate::{enumerate_split, steps_per_epoch, DirectoryCount, SplitSummary};
pub use loader::{ImageFolder, ImageSample};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Class directory names in class-index order (sorted byte order)
pub const CLASS_NAMES: [&str; crate::NUM_CLASSES] = [
    "Cherry___Powdery_mildew",
    "Cherry___healthy",
    "Grape___Black_rot",
    "Grape___Esca_Black_Measles",
    "Grape___Leaf_blight_Isariopsis_Leaf_Spot",
    "Grape___healthy",
    "Tomato___Bacterial_spot",
    "Tomato___Early_blight",
    "Tomato___Late_blight",
    "Tomato___Leaf_Mold",
    "Tomato___Septoria_leaf_spot",
    "Tomato___Spider_mites_Two-spotted_spider_mite",
    "Tomato___Target_Spot",
    "Tomato___Tomato_Yellow_Leaf_Curl_Virus",
    "Tomato___Tomato_mosaic_virus",
    "Tomato___healthy",
];

/// Abbreviated labels used on chart axes, aligned with [`CLASS_NAMES`]
pub const SHORT_NAMES: [&str; crate::NUM_CLASSES] = [
    "Ch_PM",
    "Ch_healthy",
    "Gr_BlRt",
    "Gr_EsBlMe",
    "Gr_LeafBl",
    "Gr_healthy",
    "To_BaSpt",
    "To_EarBl",
    "To_LaBl",
    "To_Leaf_Mo",
    "To_SeptLS",
    "To_Spider",
    "To_TarSpt",
    "To_YeLeafCuVi",
    "To_MVirus",
    "To_healthy",
];

/// Get the class name for a given label index
pub fn class_name(label: usize) -> Option<&'static str> {
    CLASS_NAMES.get(label).copied()
}

/// Get the short display name for a given label index
pub fn short_name(label: usize) -> Option<&'static str> {
    SHORT_NAMES.get(label).copied()
}

/// Get the label index for a given class name
pub fn class_index(name: &str) -> Option<usize> {
    CLASS_NAMES.iter().position(|&n| n == name)
}

/// One of the three on-disk dataset splits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitKind {
    Train,
    Validation,
    Test,
}

impl SplitKind {
    /// All splits in pipeline order
    pub const ALL: [SplitKind; 3] = [SplitKind::Train, SplitKind::Validation, SplitKind::Test];

    /// Directory name of the split under the data root
    pub fn dir_name(&self) -> &'static str {
        match self {
            SplitKind::Train => "train",
            SplitKind::Validation => "validation",
            SplitKind::Test => "test",
        }
    }

    /// Whether batches of this split are reshuffled each epoch
    pub fn shuffled(&self) -> bool {
        matches!(self, SplitKind::Train)
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names_are_sorted() {
        let mut sorted = CLASS_NAMES.to_vec();
        sorted.sort();
        assert_eq!(sorted, CLASS_NAMES.to_vec());
    }

    #[test]
    fn test_class_lookup() {
        assert_eq!(class_name(0), Some("Cherry___Powdery_mildew"));
        assert_eq!(class_name(15), Some("Tomato___healthy"));
        assert_eq!(class_name(16), None);
        assert_eq!(class_index("Grape___healthy"), Some(5));
        assert_eq!(class_index("Apple___Black_rot"), None);
    }

    #[test]
    fn test_short_names_align() {
        assert_eq!(short_name(class_index("Tomato___Tomato_mosaic_virus").unwrap()), Some("To_MVirus"));
        assert_eq!(short_name(class_index("Cherry___healthy").unwrap()), Some("Ch_healthy"));
        assert_eq!(short_name(40), None);
    }

    #[test]
    fn test_split_dirs() {
        assert_eq!(SplitKind::Validation.dir_name(), "validation");
        assert_eq!(SplitKind::Test.to_string(), "test");
        assert!(SplitKind::Train.shuffled());
        assert!(!SplitKind::Test.shuffled());
    }
}

//! Image-folder loader
//!
//! Loads a split laid out as one subdirectory per class:
//!
//! ```text
//! train/
//! ├── Cherry___Powdery_mildew/
//! │   ├── image1.jpg
//! │   └── image2.jpg
//! ├── Cherry___healthy/
//! │   └── ...
//! └── ...
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{SplitKind, CLASS_NAMES};
use crate::utils::error::{PipelineError, Result};

/// Extensions the image decoder is asked to read
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

/// A single image sample with its label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label index
    pub label: usize,
}

/// One split of the dataset, with samples in class-then-filename order
#[derive(Debug, Clone)]
pub struct ImageFolder {
    pub kind: SplitKind,
    pub root: PathBuf,
    /// Sorted class directory names; index = label
    pub class_names: Vec<String>,
    pub samples: Vec<ImageSample>,
}

impl ImageFolder {
    /// Load `<data_dir>/<split>` and check its classes against the vocabulary
    pub fn open(data_dir: &Path, kind: SplitKind) -> Result<Self> {
        let folder = Self::discover(&data_dir.join(kind.dir_name()), kind)?;
        validate_vocabulary(&folder.class_names, &CLASS_NAMES)?;
        Ok(folder)
    }

    /// Load a class-per-directory tree without checking class names
    pub fn discover(root: &Path, kind: SplitKind) -> Result<Self> {
        if !root.is_dir() {
            return Err(PipelineError::PathNotFound(root.to_path_buf()));
        }
        info!("Loading {} split from: {:?}", kind, root);

        let mut class_names: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_names.push(name.to_string());
                }
            }
        }
        class_names.sort();

        let mut samples = Vec::new();
        for (label, class_name) in class_names.iter().enumerate() {
            let before = samples.len();
            for entry in WalkDir::new(root.join(class_name))
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && is_image_file(entry.path()) {
                    samples.push(ImageSample {
                        path: entry.path().to_path_buf(),
                        label,
                    });
                }
            }
            debug!("Class '{}' (label {}): {} images", class_name, label, samples.len() - before);
        }

        if samples.is_empty() {
            return Err(PipelineError::Dataset(format!(
                "No images found in {} split at {}",
                kind,
                root.display()
            )));
        }

        info!(
            "Found {} images belonging to {} classes",
            samples.len(),
            class_names.len()
        );

        Ok(Self {
            kind,
            root: root.to_path_buf(),
            class_names,
            samples,
        })
    }

    /// Get the number of samples in the split
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the split is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get the number of classes
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Samples per class, indexed by label
    pub fn class_distribution(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_classes()];
        for sample in &self.samples {
            counts[sample.label] += 1;
        }
        counts
    }

    /// `(path, label)` pairs for the burn dataset
    pub fn pairs(&self) -> Vec<(PathBuf, usize)> {
        self.samples
            .iter()
            .map(|s| (s.path.clone(), s.label))
            .collect()
    }
}

/// Check whether a path carries a supported image extension
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Require the discovered class directories to match the expected vocabulary exactly
pub fn validate_vocabulary(found: &[String], expected: &[&str]) -> Result<()> {
    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|name| !found.iter().any(|f| f == name))
        .collect();
    let unexpected: Vec<&str> = found
        .iter()
        .map(String::as_str)
        .filter(|f| !expected.contains(f))
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }

    Err(PipelineError::Dataset(format!(
        "Class directories do not match the {}-class vocabulary (missing: [{}], unexpected: [{}])",
        expected.len(),
        missing.join(", "),
        unexpected.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), b"not decoded here").unwrap();
    }

    #[test]
    fn test_labels_follow_sorted_directory_names() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("train");
        touch(&root.join("Tomato___healthy"), "a.jpg");
        touch(&root.join("Cherry___healthy"), "b.png");
        touch(&root.join("Cherry___Powdery_mildew"), "c.JPG");
        touch(&root.join("Cherry___Powdery_mildew"), "notes.txt");

        let folder = ImageFolder::discover(&root, SplitKind::Train).unwrap();

        assert_eq!(
            folder.class_names,
            vec!["Cherry___Powdery_mildew", "Cherry___healthy", "Tomato___healthy"]
        );
        assert_eq!(folder.len(), 3);
        assert_eq!(folder.samples[0].label, 0);
        assert_eq!(folder.samples[2].label, 2);
        assert_eq!(folder.class_distribution(), vec![1, 1, 1]);
    }

    #[test]
    fn test_vocabulary_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("test").join("Apple___scab"), "a.jpg");

        let result = ImageFolder::open(dir.path(), SplitKind::Test);
        match result {
            Err(PipelineError::Dataset(msg)) => {
                assert!(msg.contains("Apple___scab"));
                assert!(msg.contains("Tomato___healthy"));
            }
            other => panic!("expected dataset error, got {other:?}"),
        }
    }

    #[test]
    fn test_full_vocabulary_accepted() {
        let found: Vec<String> = CLASS_NAMES.iter().map(|s| s.to_string()).collect();
        assert!(validate_vocabulary(&found, &CLASS_NAMES).is_ok());
        assert!(validate_vocabulary(&found[..15], &CLASS_NAMES).is_err());
    }

    #[test]
    fn test_empty_split_is_error() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("validation");
        fs::create_dir_all(root.join("Grape___healthy")).unwrap();

        let result = ImageFolder::discover(&root, SplitKind::Validation);
        assert!(matches!(result, Err(PipelineError::Dataset(_))));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("leaf.JPEG")));
        assert!(is_image_file(Path::new("leaf.png")));
        assert!(!is_image_file(Path::new("leaf.txt")));
        assert!(!is_image_file(Path::new("leaf")));
    }
}

//! Split enumeration
//!
//! Walks a split directory and counts the files found in each directory.
//! The totals drive `steps_per_epoch` and the validation step count, so they
//! count every regular file, not only the ones the image decoder accepts.

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::SplitKind;
use crate::utils::error::{PipelineError, Result};

/// File count for a single directory of a split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryCount {
    /// Directory path
    pub path: PathBuf,
    /// Number of immediate subdirectories
    pub subdirectories: usize,
    /// Number of immediate regular files
    pub files: usize,
}

/// Per-directory counts and the total for one split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSummary {
    pub kind: SplitKind,
    pub root: PathBuf,
    /// Every directory under `root` (inclusive), in walk order
    pub directories: Vec<DirectoryCount>,
    /// Sum of `files` over `directories`
    pub total_files: usize,
}

impl SplitSummary {
    /// Print one line per directory followed by the split total
    pub fn print(&self) {
        for dir in &self.directories {
            println!(
                "  There are {} directories and {} images in '{}'.",
                dir.subdirectories,
                dir.files,
                dir.path.display()
            );
        }
        println!(
            "  {} {}",
            format!("Total {} images:", self.kind).bold(),
            self.total_files.to_string().cyan()
        );
    }
}

/// Count files per directory under `<data_dir>/<split>`
pub fn enumerate_split(data_dir: &Path, kind: SplitKind) -> Result<SplitSummary> {
    let root = data_dir.join(kind.dir_name());
    if !root.is_dir() {
        return Err(PipelineError::PathNotFound(root));
    }

    let mut directories = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.map_err(|e| PipelineError::Dataset(format!("Failed to walk {}: {e}", root.display())))?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let mut subdirectories = 0;
        let mut files = 0;
        for child in std::fs::read_dir(entry.path())? {
            let file_type = child?.file_type()?;
            if file_type.is_dir() {
                subdirectories += 1;
            } else if file_type.is_file() {
                files += 1;
            }
        }

        debug!("{}: {} files", entry.path().display(), files);
        directories.push(DirectoryCount {
            path: entry.path().to_path_buf(),
            subdirectories,
            files,
        });
    }

    let total_files = directories.iter().map(|d| d.files).sum();
    info!("Split '{}': {} files in {} directories", kind, total_files, directories.len());

    Ok(SplitSummary {
        kind,
        root,
        directories,
        total_files,
    })
}

/// Number of batches needed to cover `total` samples once
pub fn steps_per_epoch(total: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    total.div_ceil(batch_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_split(root: &Path, counts: &[(&str, usize)]) {
        for (class, n) in counts {
            let dir = root.join(class);
            fs::create_dir_all(&dir).unwrap();
            for i in 0..*n {
                fs::write(dir.join(format!("img_{i}.jpg")), b"x").unwrap();
            }
        }
    }

    #[test]
    fn test_steps_per_epoch() {
        assert_eq!(steps_per_epoch(16888, 64), 264);
        assert_eq!(steps_per_epoch(128, 64), 2);
        assert_eq!(steps_per_epoch(129, 64), 3);
        assert_eq!(steps_per_epoch(0, 64), 0);
        assert_eq!(steps_per_epoch(10, 0), 0);
    }

    #[test]
    fn test_total_is_sum_of_directories() {
        let dir = TempDir::new().unwrap();
        make_split(
            &dir.path().join("train"),
            &[("Grape___healthy", 3), ("Tomato___healthy", 5), ("Cherry___healthy", 0)],
        );

        let summary = enumerate_split(dir.path(), SplitKind::Train).unwrap();

        // split root + 3 class directories
        assert_eq!(summary.directories.len(), 4);
        assert_eq!(summary.directories[0].subdirectories, 3);
        assert_eq!(summary.total_files, 8);
        assert_eq!(
            summary.total_files,
            summary.directories.iter().map(|d| d.files).sum::<usize>()
        );
    }

    #[test]
    fn test_missing_split_is_error() {
        let dir = TempDir::new().unwrap();
        let result = enumerate_split(dir.path(), SplitKind::Validation);
        assert!(matches!(result, Err(PipelineError::PathNotFound(_))));
    }
}

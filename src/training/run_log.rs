//! On-disk run log
//!
//! Each run gets `<logs_root>/<YYYYmmdd-HHMMSS>-<run_name>/` holding the
//! resolved configuration, per-epoch metrics as CSV, and later the history,
//! charts and evaluation reports.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use super::history::EpochMetrics;
use crate::config::PipelineConfig;
use crate::utils::error::Result;

pub const METRICS_FILE: &str = "metrics.csv";
pub const CONFIG_FILE: &str = "config.toml";

/// Create `<logs_root>/<YYYYmmdd-HHMMSS>-<run_name>/` and return its path
pub fn new_run_dir(logs_root: &Path, run_name: &str) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let base = logs_root.join(format!("{stamp}-{run_name}"));

    // Two runs started within the same second get distinct directories
    let mut dir = base.clone();
    let mut n = 1;
    while dir.exists() {
        dir = PathBuf::from(format!("{}-{n}", base.display()));
        n += 1;
    }

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Directory and metric writer of a single run
#[derive(Debug)]
pub struct RunLog {
    dir: PathBuf,
    metrics: csv::Writer<File>,
}

impl RunLog {
    /// Create a timestamped run directory under `logs_root`
    pub fn create(logs_root: &Path, run_name: &str) -> Result<Self> {
        Self::create_at(&new_run_dir(logs_root, run_name)?)
    }

    /// Use `dir` as the run directory, creating it if needed
    pub fn create_at(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let metrics = csv::Writer::from_path(dir.join(METRICS_FILE))?;
        info!("Run directory: {}", dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            metrics,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of an artifact inside the run directory
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Append one epoch row to `metrics.csv` and flush it
    pub fn append(&mut self, metrics: &EpochMetrics) -> Result<()> {
        self.metrics.serialize(metrics)?;
        self.metrics.flush()?;
        debug!("Logged epoch {} to {}", metrics.epoch, METRICS_FILE);
        Ok(())
    }

    /// Write the resolved configuration as `config.toml`
    pub fn write_config(&self, config: &PipelineConfig) -> Result<()> {
        std::fs::write(self.artifact(CONFIG_FILE), config.to_toml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metrics(epoch: usize) -> EpochMetrics {
        EpochMetrics {
            epoch,
            loss: 1.5,
            accuracy: 0.5,
            val_loss: 1.25,
            val_accuracy: 0.75,
        }
    }

    #[test]
    fn test_rows_are_appended_per_epoch() {
        let dir = TempDir::new().unwrap();
        let mut log = RunLog::create_at(&dir.path().join("run")).unwrap();

        log.append(&metrics(1)).unwrap();
        log.append(&metrics(2)).unwrap();

        let content = std::fs::read_to_string(log.artifact(METRICS_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "epoch,loss,accuracy,val_loss,val_accuracy");
        assert_eq!(lines[1], "1,1.5,0.5,1.25,0.75");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_timestamped_directories_are_distinct() {
        let dir = TempDir::new().unwrap();
        let first = RunLog::create(dir.path(), "simple").unwrap();
        let second = RunLog::create(dir.path(), "simple").unwrap();

        assert_ne!(first.dir(), second.dir());
        let name = first.dir().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("-simple"));
        assert_eq!(name.len(), "YYYYmmdd-HHMMSS-simple".len());
    }

    #[test]
    fn test_config_written() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::create_at(dir.path()).unwrap();
        log.write_config(&PipelineConfig::default()).unwrap();

        let parsed = PipelineConfig::from_file(&log.artifact(CONFIG_FILE)).unwrap();
        assert_eq!(parsed.training.epochs, 20);
    }
}

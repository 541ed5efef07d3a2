// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one row per epoch to checkpoints/metrics.csv:
//
//   epoch,train_loss,val_loss,lr,elapsed_secs
//   1,0.081342,0.024417,0.005,3.812
//   2,0.019904,0.011830,0.00475,3.790
//   ...
//
// train_loss is the mean batch MSE over the epoch; val_loss is
// whichever evaluation ran that epoch (batched or stepwise).
// The header is written only when the file is new, so several
// runs can be appended to the same log.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,

    /// Mean MSE over the epoch's training batches (normalised units)
    pub train_loss: f64,

    /// MSE on the validation windows
    pub val_loss: f64,

    /// Learning rate used for this epoch
    pub lr: f64,

    pub elapsed_secs: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, lr: f64, elapsed_secs: f64) -> Self {
        Self { epoch, train_loss, val_loss, lr, elapsed_secs }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;
        Ok(Self { csv_path: dir.join("metrics.csv") })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let is_new = !self.csv_path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(m)?;
        writer.flush()?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.5}, val_loss={:.5}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    /// Read back every row logged so far.
    pub fn read_all(&self) -> Result<Vec<EpochMetrics>> {
        let mut reader = csv::Reader::from_path(&self.csv_path)
            .with_context(|| format!("Cannot read '{}'", self.csv_path.display()))?;
        let rows = reader.deserialize().collect::<Result<Vec<EpochMetrics>, _>>()?;
        Ok(rows)
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_header_written_once_and_rows_appended() {
        let tmp    = tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path().to_string_lossy().to_string()).unwrap();

        logger.log(&EpochMetrics::new(1, 0.5, 0.4, 0.005, 1.5)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.3, 0.2, 0.00475, 1.4)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,train_loss,val_loss,lr,elapsed_secs");

        let rows = logger.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].epoch, 2);
        assert_eq!(rows[1].lr, 0.00475);
    }

    #[test]
    fn test_second_logger_appends_to_existing_file() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().to_string_lossy().to_string();

        MetricsLogger::new(dir.clone()).unwrap()
            .log(&EpochMetrics::new(1, 0.5, 0.4, 0.005, 1.0)).unwrap();
        let second = MetricsLogger::new(dir).unwrap();
        second.log(&EpochMetrics::new(1, 0.6, 0.5, 0.005, 1.0)).unwrap();

        assert_eq!(second.read_all().unwrap().len(), 2);
    }
}

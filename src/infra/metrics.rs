// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Appends one CSV row per epoch:
//
//   epoch,lr,train_loss,test_loss,accuracy
//   1,0.010000,0.612345,0.154321,0.953100
//   2,0.010000,0.123456,0.098765,0.970200
//   ...
//
// Output file: {checkpoint_dir}/metrics.csv
// The header is written only when the file is new, so repeated
// runs into the same directory keep appending.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::metrics::EvalSummary;

const CSV_HEADER: &str = "epoch,lr,train_loss,test_loss,accuracy";

/// One row of metrics for a single epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    /// Learning rate used for every step of this epoch
    pub lr:         f64,
    /// Mean batch loss over the training pass
    pub train_loss: f64,
    /// Mean batch loss over the evaluation pass
    pub test_loss:  f64,
    /// Range: [0.0, 1.0]
    pub accuracy:   f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, lr: f64, train_loss: f64, eval: &EvalSummary) -> Self {
        Self {
            epoch,
            lr,
            train_loss,
            test_loss: eval.avg_loss,
            accuracy:  eval.accuracy,
        }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.lr, m.train_loss, m.test_loss, m.accuracy,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, test_loss={:.4}",
            m.epoch, m.train_loss, m.test_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> EvalSummary {
        EvalSummary { avg_loss: 0.25, correct: 7, total: 10, accuracy: 0.7 }
    }

    #[test]
    fn test_header_then_rows() {
        let tmp    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path()).unwrap();

        logger.log(&EpochMetrics::new(1, 0.01, 0.5, &summary())).unwrap();
        logger.log(&EpochMetrics::new(2, 0.01, 0.4, &summary())).unwrap();

        let text  = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "1,0.010000,0.500000,0.250000,0.700000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_reopening_does_not_repeat_header() {
        let tmp = tempfile::tempdir().unwrap();
        MetricsLogger::new(tmp.path()).unwrap()
            .log(&EpochMetrics::new(1, 0.01, 0.5, &summary())).unwrap();
        let logger = MetricsLogger::new(tmp.path()).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.matches(CSV_HEADER).count(), 1);
    }
}

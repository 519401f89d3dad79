// ============================================================
// Layer 3 - Running Evaluation Metrics
// ============================================================
// Accumulates loss and correct-prediction counts across the
// batches of one evaluation pass, then reduces them:
//
//   avg_loss = sum(batch losses) / number of batches
//   accuracy = correct / total examples
//
// The batch loss is already a mean over the batch, so the
// average here is a mean of means (one term per batch).

use serde::{Deserialize, Serialize};

/// Final numbers for one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    pub avg_loss: f64,
    pub correct:  usize,
    pub total:    usize,
    /// Range: [0.0, 1.0]
    pub accuracy: f64,
}

impl EvalSummary {
    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy * 100.0
    }
}

/// Running sums for an evaluation pass.
#[derive(Debug, Clone, Default)]
pub struct EvalAccumulator {
    loss_sum: f64,
    batches:  usize,
    correct:  usize,
    total:    usize,
}

impl EvalAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one batch: its mean loss, how many predictions were
    /// right, and how many examples it held.
    pub fn add_batch(&mut self, loss: f64, correct: usize, count: usize) {
        self.loss_sum += loss;
        self.batches  += 1;
        self.correct  += correct;
        self.total    += count;
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn summary(&self) -> EvalSummary {
        let avg_loss = if self.batches > 0 { self.loss_sum / self.batches as f64 } else { f64::NAN };
        let accuracy = if self.total   > 0 { self.correct as f64 / self.total as f64 } else { 0.0 };
        EvalSummary { avg_loss, correct: self.correct, total: self.total, accuracy }
    }
}

/// Mean of a running loss sum, NaN when nothing was seen.
pub fn mean_loss(sum: f64, batches: usize) -> f64 {
    if batches > 0 { sum / batches as f64 } else { f64::NAN }
}

/// Percentage of an epoch already consumed, `seen` examples out of `total`.
pub fn progress_percent(seen: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    100.0 * seen as f64 / total as f64
}

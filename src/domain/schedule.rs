// ============================================================
// Layer 3 - Learning Rate Schedule
// ============================================================
// Piecewise-constant schedule, purely a function of the epoch
// index. No dependence on observed loss, no smoothing.
//
// LeNet schedule used for MNIST:
//
//   epoch  1 ..  9  → 0.01
//   epoch 10 .. 14  → 0.001
//   epoch 15 ..     → 0.0001
//
// The schedule is applied before every epoch, including the
// first, so it always wins over the configured initial rate.

use serde::{Deserialize, Serialize};

use crate::domain::traits::LearningRateSchedule;

/// Rate used before the first milestone.
pub const LENET_BASE_LR: f64 = 0.01;

/// (first epoch, rate) pairs for the LeNet schedule.
pub const LENET_MILESTONES: [(usize, f64); 2] = [(10, 0.001), (15, 0.0001)];

/// A schedule that holds `base` until the first milestone epoch,
/// then jumps to each milestone's rate from that epoch onwards.
///
/// Milestones are kept sorted by epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseConstant {
    pub base:       f64,
    pub milestones: Vec<(usize, f64)>,
}

impl PiecewiseConstant {
    pub fn new(base: f64, mut milestones: Vec<(usize, f64)>) -> Self {
        milestones.sort_by_key(|&(epoch, _)| epoch);
        Self { base, milestones }
    }

    /// The 0.01 / 0.001 / 0.0001 schedule with milestones at 10 and 15.
    pub fn lenet() -> Self {
        Self::new(LENET_BASE_LR, LENET_MILESTONES.to_vec())
    }

    /// Epochs at which the rate changes.
    pub fn boundaries(&self) -> impl Iterator<Item = usize> + '_ {
        self.milestones.iter().map(|&(epoch, _)| epoch)
    }
}

impl Default for PiecewiseConstant {
    fn default() -> Self {
        Self::lenet()
    }
}

impl LearningRateSchedule for PiecewiseConstant {
    fn learning_rate(&self, epoch: usize) -> f64 {
        self.milestones
            .iter()
            .take_while(|&&(start, _)| epoch >= start)
            .last()
            .map(|&(_, lr)| lr)
            .unwrap_or(self.base)
    }
}

/// Learning rate for `epoch` under the LeNet schedule.
pub fn adjust_learning_rate(epoch: usize) -> f64 {
    PiecewiseConstant::lenet().learning_rate(epoch)
}

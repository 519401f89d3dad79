// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The training driver depends on these traits rather than on
// concrete types, so a schedule can be swapped without
// touching the epoch loop.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

// ─── LearningRateSchedule ─────────────────────────────────────────────────────
/// Anything that maps an epoch index to a learning rate.
///
/// Implementations:
///   - PiecewiseConstant → fixed rates between epoch milestones
///   - any `Fn(usize) -> f64`, e.g. `schedule::adjust_learning_rate`
pub trait LearningRateSchedule {
    /// Learning rate to use for every step of `epoch` (1-indexed).
    fn learning_rate(&self, epoch: usize) -> f64;
}

impl<F: Fn(usize) -> f64> LearningRateSchedule for F {
    fn learning_rate(&self, epoch: usize) -> f64 {
        self(epoch)
    }
}

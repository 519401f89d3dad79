// ============================================================
// Layer 2 - EvaluateUseCase
// ============================================================
// Re-scores a saved checkpoint against the MNIST test split:
//   1. read train_config.json from the checkpoint directory
//   2. restore LeNet_{epoch} (or the latest epoch)
//   3. one evaluation pass, same summary line as training

use anyhow::Result;

use crate::domain::metrics::EvalSummary;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    backend::ComputeBackend,
    evaluator::{print_summary, run_evaluation},
};

pub struct EvaluateUseCase {
    checkpoint_dir: String,
    epoch:          Option<usize>,
    batch_size:     Option<usize>,
    force_cpu:      bool,
}

impl EvaluateUseCase {
    pub fn new(
        checkpoint_dir: String,
        epoch:          Option<usize>,
        batch_size:     Option<usize>,
        force_cpu:      bool,
    ) -> Self {
        Self { checkpoint_dir, epoch, batch_size, force_cpu }
    }

    pub fn execute(&self) -> Result<EvalSummary> {
        let ckpt_manager = CheckpointManager::new(&self.checkpoint_dir)?;
        let cfg = ckpt_manager.load_config()?;
        tracing::debug!("Checkpoints on disk for epochs {:?}", ckpt_manager.saved_epochs()?);

        // The backend the run was trained on, unless the caller forces CPU.
        let backend = if self.force_cpu { ComputeBackend::Cpu } else { cfg.backend.resolve() };
        let batch_size = self.batch_size.unwrap_or(cfg.batch_size).max(1);

        tracing::info!(
            "Evaluating checkpoint {} on {}",
            self.epoch.map_or_else(|| "latest".to_string(), |e| e.to_string()),
            backend.name(),
        );

        let summary = run_evaluation(backend, &ckpt_manager, self.epoch, batch_size)?;
        print_summary(&summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let use_case = EvaluateUseCase::new(tmp.path().display().to_string(), None, None, true);

        let err = use_case.execute().unwrap_err();
        assert!(err.to_string().contains("train_config.json"));
    }
}

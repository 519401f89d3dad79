// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 0: Fall back to the CPU if no accelerator  (Layer 5 - ml)
//   Step 1: Print the run settings              (console)
//   Step 2: Check the configured initial rate   (domain - schedule)
//   Step 3: Prepare the checkpoint directory    (Layer 6 - infra)
//   Step 4: Save the run config                 (Layer 6 - infra)
//   Step 5: Run the training driver             (Layer 5 - ml)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{schedule::PiecewiseConstant, traits::LearningRateSchedule};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    backend::ComputeBackend,
    trainer::{run_training, RunReport},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Serialisable so `evaluate` can reload it from the checkpoint directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub checkpoint_dir: String,
    pub batch_size:     usize,
    pub epochs:         usize,
    /// Learning rate given on the command line. The epoch schedule
    /// replaces it before every epoch; kept so the run records both.
    pub initial_lr:     f64,
    pub momentum:       f64,
    pub backend:        ComputeBackend,
    pub seed:           u64,
    pub num_workers:    usize,
    pub log_interval:   usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: ".".to_string(),
            batch_size:     128,
            epochs:         20,
            initial_lr:     0.1,
            momentum:       0.9,
            backend:        ComputeBackend::Accelerator,
            seed:           1,
            num_workers:    0,
            log_interval:   1,
        }
    }
}

impl TrainConfig {
    /// (name, value) pairs for the settings dump at the start of a run.
    pub fn settings(&self) -> Vec<(&'static str, String)> {
        vec![
            ("batch_size",     self.batch_size.to_string()),
            ("epochs",         self.epochs.to_string()),
            ("lr",             self.initial_lr.to_string()),
            ("momentum",       self.momentum.to_string()),
            ("backend",        self.backend.name().to_string()),
            ("seed",           self.seed.to_string()),
            ("checkpoint_dir", self.checkpoint_dir.clone()),
            ("num_workers",    self.num_workers.to_string()),
            ("log_interval",   self.log_interval.to_string()),
        ]
    }
}

/// Returns a warning when `initial_lr` is not what the schedule uses for epoch 1.
pub fn initial_lr_conflict(cfg: &TrainConfig, schedule: &impl LearningRateSchedule) -> Option<String> {
    let scheduled = schedule.learning_rate(1);
    (cfg.initial_lr != scheduled).then(|| {
        format!(
            "--lr {} is superseded by the epoch schedule (epoch 1 uses {})",
            cfg.initial_lr, scheduled
        )
    })
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<RunReport> {
        ensure!(self.config.batch_size > 0, "--batch-size must be at least 1");
        let cfg = &TrainConfig { backend: self.config.backend.resolve(), ..self.config.clone() };

        // ── Step 1: Settings dump ─────────────────────────────────────────────
        println!("\t< Training settings >");
        for (name, value) in cfg.settings() {
            println!("\t {name} {value}");
        }
        println!("--------------------------------------\n");

        // ── Step 2: Initial rate vs. schedule ─────────────────────────────────
        let schedule = PiecewiseConstant::lenet();
        tracing::info!(
            "Learning rate changes at epochs {:?}",
            schedule.boundaries().collect::<Vec<_>>()
        );
        if let Some(warning) = initial_lr_conflict(cfg, &schedule) {
            tracing::warn!("{warning}");
        }

        // ── Step 3 + 4: Checkpoint directory and config ───────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 5: Training loop (Layer 5) ───────────────────────────────────
        run_training(cfg, ckpt_manager, schedule)
    }
}

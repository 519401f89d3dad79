// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Two subcommands: `train` and `evaluate`.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::backend::ComputeBackend;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train LeNet on MNIST, checkpointing after every epoch
    Train(TrainArgs),

    /// Score a saved checkpoint on the MNIST test split
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Input batch size for training and evaluation
    #[arg(long, default_value_t = 128, value_name = "N")]
    pub batch_size: usize,

    /// Number of epochs to train
    #[arg(long, default_value_t = 20, value_name = "N")]
    pub epochs: usize,

    /// Initial learning rate (the epoch schedule overrides it from epoch 1)
    #[arg(long, default_value_t = 0.1, value_name = "LR")]
    pub lr: f64,

    /// SGD momentum
    #[arg(long, default_value_t = 0.9, value_name = "M")]
    pub momentum: f64,

    /// Train on the CPU backend instead of the GPU accelerator
    #[arg(long, visible_alias = "no-cuda")]
    pub no_accel: bool,

    /// Random seed for initialisation and shuffling
    #[arg(long, default_value_t = 1, value_name = "S")]
    pub seed: u64,

    /// Directory for LeNet_{epoch} checkpoints, config and metrics
    #[arg(long, default_value = ".")]
    pub checkpoint_dir: String,

    /// Data-loader worker threads. 0 loads on the training thread in a
    /// fixed order; more than 0 gives up reproducible batch order
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub num_workers: usize,

    /// Print a progress line every N training batches
    #[arg(long, default_value_t = 1, value_name = "N")]
    pub log_interval: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            initial_lr:     a.lr,
            momentum:       a.momentum,
            backend:        ComputeBackend::select(a.no_accel),
            seed:           a.seed,
            num_workers:    a.num_workers,
            log_interval:   a.log_interval,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory the training run wrote its checkpoints to
    #[arg(long, default_value = ".")]
    pub checkpoint_dir: String,

    /// Epoch to evaluate (defaults to the latest saved one)
    #[arg(long)]
    pub epoch: Option<usize>,

    /// Batch size (defaults to the one used for training)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Evaluate on the CPU backend
    #[arg(long, visible_alias = "no-cuda")]
    pub no_accel: bool,
}

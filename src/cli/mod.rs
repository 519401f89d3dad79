// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to a use case.
//
//   1. `train`    - trains LeNet, one checkpoint per epoch
//   2. `evaluate` - scores a saved checkpoint on the test split

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "lenet-mnist",
    version,
    about = "Train a LeNet convolutional network on MNIST and evaluate its checkpoints."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training for {} epochs", args.epochs);

    let report = TrainUseCase::new(args.into()).execute()?;

    match report.last() {
        Some(last) => println!(
            "Training complete. {} checkpoints saved, last: {}",
            report.epochs.len(),
            last.checkpoint.display()
        ),
        None => println!("Training complete. No epochs were run."),
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    EvaluateUseCase::new(args.checkpoint_dir, args.epoch, args.batch_size, args.no_accel)
        .execute()?;
    Ok(())
}

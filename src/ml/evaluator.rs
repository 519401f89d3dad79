// ============================================================
// Layer 5 - Evaluator
// ============================================================
// One read-only pass over an evaluation loader:
//   forward → batch loss → argmax prediction → correct count
// reduced through the domain EvalAccumulator.
//
// Works on any backend. The training driver hands it
// `model.valid()` (no autodiff graph), the evaluate command
// hands it a model restored from a checkpoint.
//
// Both build their loader with `evaluation_loader`: one thread,
// dataset order, so the batch count and the mean-of-batch-means
// loss are the same on both paths.

use std::sync::Arc;

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};

use crate::data::{
    batcher::{DigitBatch, DigitBatcher},
    dataset::DigitDataset,
};
use crate::domain::metrics::{EvalAccumulator, EvalSummary};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    backend::{accel_device, cpu_device, AccelBackend, ComputeBackend, CpuBackend},
    model::{LeNet, LeNetConfig},
};

/// Unshuffled, single-threaded loader over `dataset`.
pub fn evaluation_loader<B: Backend>(
    dataset:    DigitDataset,
    batch_size: usize,
    device:     B::Device,
) -> Arc<dyn DataLoader<DigitBatch<B>>> {
    DataLoaderBuilder::new(DigitBatcher::<B>::new(device))
        .batch_size(batch_size)
        .build(dataset)
}

/// Number of rows whose argmax over classes equals the target.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns [batch, 1], squeeze to [batch] before comparing
    let predictions = logits.argmax(1).squeeze::<1>(1);
    predictions
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

pub fn evaluate_model<B: Backend>(
    model:  &LeNet<B>,
    loader: &dyn DataLoader<DigitBatch<B>>,
) -> EvalSummary {
    let mut acc = EvalAccumulator::new();

    for batch in loader.iter() {
        let count = batch.len();
        let (loss, logits) = model.forward_classification(batch.images, batch.targets.clone());

        let loss: f64 = loss.into_scalar().elem::<f64>();
        let correct = count_correct(logits, batch.targets);
        acc.add_batch(loss, correct, count);
    }

    tracing::debug!("Evaluated {} batches", acc.batches());
    acc.summary()
}

/// Load checkpoint `epoch` (latest when `None`) into `model` and score it on `loader`.
pub fn evaluate_checkpoint<B: Backend>(
    ckpt_manager: &CheckpointManager,
    epoch:        Option<usize>,
    model:        LeNet<B>,
    loader:       &dyn DataLoader<DigitBatch<B>>,
    device:       &B::Device,
) -> Result<EvalSummary> {
    let model = ckpt_manager.load_model(model, epoch, device)?;
    Ok(evaluate_model(&model, loader))
}

/// Score a saved checkpoint against the MNIST test split on `backend`.
pub fn run_evaluation(
    backend:      ComputeBackend,
    ckpt_manager: &CheckpointManager,
    epoch:        Option<usize>,
    batch_size:   usize,
) -> Result<EvalSummary> {
    match backend {
        ComputeBackend::Accelerator => {
            evaluate_on_test_split::<AccelBackend>(ckpt_manager, epoch, batch_size, accel_device())
        }
        ComputeBackend::Cpu => {
            evaluate_on_test_split::<CpuBackend>(ckpt_manager, epoch, batch_size, cpu_device())
        }
    }
}

fn evaluate_on_test_split<B: Backend>(
    ckpt_manager: &CheckpointManager,
    epoch:        Option<usize>,
    batch_size:   usize,
    device:       B::Device,
) -> Result<EvalSummary> {
    let loader = evaluation_loader::<B>(DigitDataset::test(), batch_size, device.clone());
    let model: LeNet<B> = LeNetConfig::new().init(&device);
    evaluate_checkpoint(ckpt_manager, epoch, model, loader.as_ref(), &device)
}

pub fn print_summary(summary: &EvalSummary) {
    println!(
        "\nTest set: Average loss: {:.4}, Accuracy: {}/{} ({:.0}%)\n",
        summary.avg_loss,
        summary.correct,
        summary.total,
        summary.accuracy_percent(),
    );
}

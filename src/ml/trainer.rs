// ============================================================
// Layer 5 - Training Driver
// ============================================================
// Owns the epoch loop. Per epoch, strictly in this order:
//
//   a. adjust_learning_rate(epoch)   piecewise schedule
//   b. train_epoch(epoch)            forward → loss → backward → SGD step
//   c. evaluate_epoch(epoch)         forward only, loss + accuracy
//   d. checkpoint                    LeNet_{epoch}.mpk
//
// No early stopping and no best-model tracking: every epoch's
// checkpoint is kept. A framework panic inside a batch aborts
// the run, leaving the checkpoints of completed epochs on disk.
//
// Burn notes:
//   - Training runs on B (Autodiff<...>) so loss.backward() works
//   - model.valid() returns the model on B::InnerBackend, which
//     is what the evaluation loader must produce batches for
//   - every backward() yields a fresh gradient set, so there is
//     nothing to zero between steps
//
// Reference: Burn Book §5 (Custom Training Loop)

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{
        adaptor::OptimizerAdaptor, momentum::MomentumConfig, GradientsParams, Optimizer, Sgd, SgdConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{DigitBatch, DigitBatcher},
    dataset::DigitDataset,
};
use crate::domain::{
    metrics::{mean_loss, progress_percent, EvalSummary},
    schedule::adjust_learning_rate,
    traits::LearningRateSchedule,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    backend::{accel_device, cpu_device, AccelTrainBackend, ComputeBackend, CpuTrainBackend},
    evaluator::{evaluate_model, evaluation_loader, print_summary},
    model::{LeNet, LeNetConfig},
};

/// What one completed epoch produced.
#[derive(Debug, Clone)]
pub struct EpochReport {
    pub epoch:      usize,
    pub lr:         f64,
    pub train_loss: f64,
    pub eval:       EvalSummary,
    pub checkpoint: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub epochs: Vec<EpochReport>,
}

impl RunReport {
    pub fn last(&self) -> Option<&EpochReport> {
        self.epochs.last()
    }
}

pub struct TrainingDriver<B: AutodiffBackend, O> {
    model:        LeNet<B>,
    optim:        O,
    schedule:     Box<dyn LearningRateSchedule>,
    lr:           f64,
    train_loader: Arc<dyn DataLoader<DigitBatch<B>>>,
    test_loader:  Arc<dyn DataLoader<DigitBatch<B::InnerBackend>>>,
    checkpoints:  CheckpointManager,
    metrics:      Option<MetricsLogger>,
    log_interval: usize,
}

impl<B, O> TrainingDriver<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<LeNet<B>, B>,
{
    /// `initial_lr` is only the starting value; the schedule replaces it
    /// before the first batch of every epoch.
    pub fn new(
        model:        LeNet<B>,
        optim:        O,
        initial_lr:   f64,
        train_loader: Arc<dyn DataLoader<DigitBatch<B>>>,
        test_loader:  Arc<dyn DataLoader<DigitBatch<B::InnerBackend>>>,
        checkpoints:  CheckpointManager,
    ) -> Self {
        Self {
            model,
            optim,
            schedule: Box::new(adjust_learning_rate),
            lr: initial_lr,
            train_loader,
            test_loader,
            checkpoints,
            metrics: None,
            log_interval: 1,
        }
    }

    pub fn with_schedule(mut self, schedule: impl LearningRateSchedule + 'static) -> Self {
        self.schedule = Box::new(schedule);
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsLogger) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Print a progress line every `interval` batches (0 is treated as 1).
    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval.max(1);
        self
    }

    pub fn model(&self) -> &LeNet<B> {
        &self.model
    }

    /// Rate the optimizer will be stepped with.
    pub fn learning_rate(&self) -> f64 {
        self.lr
    }

    /// Set the learning rate for `epoch` from the schedule and return it.
    pub fn adjust_learning_rate(&mut self, epoch: usize) -> f64 {
        let lr = self.schedule.learning_rate(epoch);
        if lr != self.lr {
            tracing::info!("Epoch {}: learning rate {} → {}", epoch, self.lr, lr);
        }
        self.lr = lr;
        lr
    }

    /// One pass over the training loader. Returns the mean batch loss.
    pub fn train_epoch(&mut self, epoch: usize) -> f64 {
        let total = self.train_loader.num_items();
        let mut seen     = 0usize;
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        println!("\nStart training ...");
        for (batch_idx, batch) in self.train_loader.iter().enumerate() {
            let count = batch.len();

            let (loss, _) = self.model.forward_classification(batch.images, batch.targets);
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &self.model);
            self.model = self.optim.step(self.lr, self.model.clone(), grads);

            if batch_idx % self.log_interval == 0 {
                println!(
                    "Train Epoch: {} [{}/{} ({:.0}%)]\tLoss: {:.6}",
                    epoch, seen, total, progress_percent(seen, total), loss_val,
                );
            }

            seen     += count;
            loss_sum += loss_val;
            batches  += 1;
        }

        let avg = mean_loss(loss_sum, batches);
        tracing::debug!(
            "Epoch {} trained on {} batches at lr {}, mean loss {:.4}",
            epoch, batches, self.learning_rate(), avg,
        );
        avg
    }

    /// One read-only pass over the evaluation loader.
    pub fn evaluate_epoch(&self, epoch: usize) -> EvalSummary {
        // Inference copy: no autodiff graph, training-only behaviour off.
        let model = self.model.valid();
        let summary = evaluate_model(&model, self.test_loader.as_ref());

        print_summary(&summary);
        tracing::info!(
            "Epoch {} evaluation: loss={:.4} accuracy={:.2}%",
            epoch, summary.avg_loss, summary.accuracy_percent(),
        );
        summary
    }

    /// Train and evaluate epochs 1..=max_epochs, checkpointing after each.
    pub fn run(&mut self, max_epochs: usize) -> Result<RunReport> {
        let mut report = RunReport::default();

        for epoch in 1..=max_epochs {
            let lr         = self.adjust_learning_rate(epoch);
            let train_loss = self.train_epoch(epoch);
            let eval       = self.evaluate_epoch(epoch);

            let checkpoint = self.checkpoints.save_model(self.model(), epoch)?;
            tracing::info!("Checkpoint saved for epoch {}: '{}'", epoch, checkpoint.display());

            if let Some(metrics) = &self.metrics {
                metrics.log(&EpochMetrics::new(epoch, lr, train_loss, &eval))?;
            }

            report.epochs.push(EpochReport { epoch, lr, train_loss, eval, checkpoint });
        }

        tracing::info!("Training complete after {} epochs", max_epochs);
        Ok(report)
    }
}

// ─── Entry point from the application layer ──────────────────────────────────

/// Build model, optimizer and MNIST loaders on the configured backend and run.
pub fn run_training(
    cfg:          &TrainConfig,
    ckpt_manager: CheckpointManager,
    schedule:     impl LearningRateSchedule + 'static,
) -> Result<RunReport> {
    match cfg.backend {
        ComputeBackend::Accelerator => {
            let device = accel_device();
            tracing::info!("Using WGPU device: {:?}", device);
            train_on::<AccelTrainBackend>(cfg, ckpt_manager, schedule, device)
        }
        ComputeBackend::Cpu => {
            tracing::info!("Using NdArray CPU backend");
            train_on::<CpuTrainBackend>(cfg, ckpt_manager, schedule, cpu_device())
        }
    }
}

/// SGD with classic momentum, no dampening.
pub fn sgd_optimizer<B: AutodiffBackend>(
    momentum: f64,
) -> OptimizerAdaptor<Sgd<B::InnerBackend>, LeNet<B>, B> {
    SgdConfig::new()
        .with_momentum(Some(
            MomentumConfig::new()
                .with_momentum(momentum)
                .with_dampening(0.0),
        ))
        .init::<B, LeNet<B>>()
}

/// Training loader, reshuffled every epoch from `cfg.seed`.
///
/// With `num_workers == 0` batches arrive in the shuffled order, so a
/// fixed seed reproduces the run. Worker threads each shuffle their own
/// slice of the dataset and hand batches back as they finish, so the
/// order (and the trained weights) can differ between runs.
pub fn training_loader<B: Backend>(
    dataset: DigitDataset,
    cfg:     &TrainConfig,
    device:  B::Device,
) -> Arc<dyn DataLoader<DigitBatch<B>>> {
    let builder = DataLoaderBuilder::new(DigitBatcher::<B>::new(device))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed);
    if cfg.num_workers > 0 {
        tracing::warn!(
            "{} loader workers: batch order is not reproducible across runs",
            cfg.num_workers
        );
        builder.num_workers(cfg.num_workers).build(dataset)
    } else {
        builder.build(dataset)
    }
}

fn train_on<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    ckpt_manager: CheckpointManager,
    schedule:     impl LearningRateSchedule + 'static,
    device:       B::Device,
) -> Result<RunReport> {
    let model: LeNet<B> = LeNetConfig::new().init_seeded(cfg.seed, &device);
    println!("{model}");
    tracing::info!("LeNet ready: {} parameters", model.num_params());

    let optim = sgd_optimizer::<B>(cfg.momentum);

    let train_loader = training_loader::<B>(DigitDataset::train(), cfg, device.clone());
    let test_loader  = evaluation_loader::<B::InnerBackend>(DigitDataset::test(), cfg.batch_size, device);

    let metrics = MetricsLogger::new(ckpt_manager.dir())?;
    tracing::info!("Metrics will be appended to '{}'", metrics.csv_path().display());

    let mut driver = TrainingDriver::new(model, optim, cfg.initial_lr, train_loader, test_loader, ckpt_manager)
        .with_schedule(schedule)
        .with_metrics(metrics)
        .with_log_interval(cfg.log_interval);

    driver.run(cfg.epochs)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{Autodiff, NdArray},
        data::{dataloader::batcher::Batcher, dataset::vision::MnistItem},
    };
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::domain::schedule::PiecewiseConstant;
    use crate::ml::model::test_init::{lenet, seeded_lenet};

    type TestBackend   = Autodiff<NdArray>;
    type TestOptimizer = OptimizerAdaptor<Sgd<NdArray>, LeNet<TestBackend>, TestBackend>;

    fn synthetic_items(count: usize, seed: u64) -> Vec<MnistItem> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|i| {
                let mut image = [[0.0f32; 28]; 28];
                for row in image.iter_mut() {
                    for p in row.iter_mut() {
                        *p = rng.gen_range(0.0..255.0);
                    }
                }
                MnistItem { image, label: (i % 10) as u8 }
            })
            .collect()
    }

    fn driver(
        model:      LeNet<TestBackend>,
        train:      Vec<MnistItem>,
        test:       Vec<MnistItem>,
        batch_size: usize,
        dir:        &std::path::Path,
    ) -> TrainingDriver<TestBackend, TestOptimizer> {
        let device = Default::default();
        let train_loader = DataLoaderBuilder::new(DigitBatcher::<TestBackend>::new(device))
            .batch_size(batch_size)
            .build(DigitDataset::from_items(train));
        let test_loader = DataLoaderBuilder::new(DigitBatcher::<NdArray>::new(device))
            .batch_size(batch_size)
            .build(DigitDataset::from_items(test));
        let ckpt = CheckpointManager::new(dir).unwrap();

        TrainingDriver::new(model, sgd_optimizer::<TestBackend>(0.9), 0.1, train_loader, test_loader, ckpt)
            .with_log_interval(100)
    }

    fn flat<B: Backend, const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
        t.into_data().convert::<f32>().to_vec().unwrap()
    }

    fn snapshot<B: Backend>(m: &LeNet<B>) -> Vec<Vec<f32>> {
        vec![
            flat(m.conv1.weight.val()),
            flat(m.conv2.weight.val()),
            flat(m.fc1.weight.val()),
            flat(m.fc2.weight.val()),
            flat(m.fc3.weight.val()),
            flat(m.fc3.bias.as_ref().unwrap().val()),
        ]
    }

    fn new_model() -> LeNet<TestBackend> {
        lenet(&Default::default())
    }

    #[test]
    fn test_run_writes_one_checkpoint_per_epoch() {
        let tmp = tempfile::tempdir().unwrap();
        let mut d = driver(new_model(), synthetic_items(12, 1), synthetic_items(6, 2), 4, tmp.path());

        let report = d.run(3).unwrap();

        assert_eq!(report.epochs.len(), 3);
        for (i, epoch) in report.epochs.iter().enumerate() {
            assert_eq!(epoch.epoch, i + 1);
            assert_eq!(epoch.checkpoint, tmp.path().join(format!("LeNet_{}.mpk", i + 1)));
            assert!(epoch.checkpoint.exists());
            assert_eq!(epoch.eval.total, 6);
        }
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        assert_eq!(ckpt.saved_epochs().unwrap(), vec![1, 2, 3]);
        assert_eq!(ckpt.latest_epoch().unwrap(), 3);
    }

    #[test]
    fn test_schedule_overrides_initial_lr() {
        let tmp = tempfile::tempdir().unwrap();
        let mut d = driver(new_model(), synthetic_items(4, 1), synthetic_items(4, 2), 4, tmp.path());

        assert_eq!(d.learning_rate(), 0.1);
        assert_eq!(d.adjust_learning_rate(1),  0.01);
        assert_eq!(d.learning_rate(), 0.01);
        assert_eq!(d.adjust_learning_rate(10), 0.001);
        assert_eq!(d.adjust_learning_rate(15), 0.0001);

        let report = d.run(1).unwrap();
        assert_eq!(report.epochs[0].lr, 0.01);
    }

    #[test]
    fn test_custom_schedule() {
        let tmp = tempfile::tempdir().unwrap();
        let mut d = driver(new_model(), synthetic_items(4, 1), synthetic_items(4, 2), 4, tmp.path())
            .with_schedule(PiecewiseConstant::new(0.05, vec![(2, 0.005)]));

        let report = d.run(2).unwrap();
        assert_eq!(report.epochs[0].lr, 0.05);
        assert_eq!(report.epochs[1].lr, 0.005);
    }

    #[test]
    fn test_evaluate_does_not_touch_parameters() {
        let tmp = tempfile::tempdir().unwrap();
        let d = driver(new_model(), synthetic_items(8, 1), synthetic_items(8, 2), 4, tmp.path());

        let before = snapshot(d.model());
        let summary = d.evaluate_epoch(1);
        let after = snapshot(d.model());

        assert_eq!(before, after);
        assert_eq!(summary.total, 8);
        assert!((0.0..=1.0).contains(&summary.accuracy));
    }

    #[test]
    fn test_train_epoch_updates_parameters() {
        let tmp = tempfile::tempdir().unwrap();
        let mut d = driver(new_model(), synthetic_items(8, 1), synthetic_items(4, 2), 4, tmp.path());

        let before = snapshot(d.model());
        d.adjust_learning_rate(1);
        let loss = d.train_epoch(1);

        assert!(loss.is_finite());
        assert_ne!(before, snapshot(d.model()));
    }

    #[test]
    fn test_same_start_same_data_gives_same_weights() {
        let model = new_model();
        let train = synthetic_items(16, 3);
        let test  = synthetic_items(8, 4);

        let tmp_a = tempfile::tempdir().unwrap();
        let tmp_b = tempfile::tempdir().unwrap();
        let mut a = driver(model.clone(), train.clone(), test.clone(), 4, tmp_a.path());
        let mut b = driver(model,         train,         test,         4, tmp_b.path());

        let report_a = a.run(2).unwrap();
        let report_b = b.run(2).unwrap();

        assert_eq!(snapshot(a.model()), snapshot(b.model()));
        assert_eq!(report_a.epochs[1].eval, report_b.epochs[1].eval);
    }

    /// One full `train_on`-style run on synthetic data: seeded init, the
    /// configured training loader, the shared evaluation loader.
    fn seeded_run(cfg: &TrainConfig, dir: &std::path::Path) -> (Vec<Vec<f32>>, RunReport) {
        let device = Default::default();
        let model: LeNet<TestBackend> = seeded_lenet(cfg.seed, &device);

        let train_loader =
            training_loader::<TestBackend>(DigitDataset::from_items(synthetic_items(40, 5)), cfg, device);
        let test_loader =
            evaluation_loader::<NdArray>(DigitDataset::from_items(synthetic_items(12, 6)), cfg.batch_size, device);

        let ckpt = CheckpointManager::new(dir).unwrap();
        let mut d = TrainingDriver::new(
            model,
            sgd_optimizer::<TestBackend>(cfg.momentum),
            cfg.initial_lr,
            train_loader,
            test_loader,
            ckpt,
        )
        .with_log_interval(100);

        let report = d.run(cfg.epochs).unwrap();
        (snapshot(d.model()), report)
    }

    #[test]
    fn test_same_seed_reproduces_run() {
        let cfg = TrainConfig { batch_size: 8, epochs: 2, seed: 11, ..TrainConfig::default() };
        assert_eq!(cfg.num_workers, 0);

        let tmp_a = tempfile::tempdir().unwrap();
        let tmp_b = tempfile::tempdir().unwrap();
        let (weights_a, report_a) = seeded_run(&cfg, tmp_a.path());
        let (weights_b, report_b) = seeded_run(&cfg, tmp_b.path());

        assert_eq!(weights_a, weights_b);
        assert_eq!(report_a.epochs[1].train_loss, report_b.epochs[1].train_loss);
        assert_eq!(report_a.epochs[1].eval, report_b.epochs[1].eval);

        // The saved checkpoints hold the same weights too.
        let device = Default::default();
        let restored_a = CheckpointManager::new(tmp_a.path()).unwrap()
            .load_model(lenet::<TestBackend>(&device), Some(2), &device).unwrap();
        let restored_b = CheckpointManager::new(tmp_b.path()).unwrap()
            .load_model(lenet::<TestBackend>(&device), Some(2), &device).unwrap();
        assert_eq!(snapshot(&restored_a), snapshot(&restored_b));
    }

    #[test]
    fn test_training_loader_shuffles_by_seed() {
        let device = Default::default();
        let labels = |seed: u64| -> Vec<i64> {
            let cfg = TrainConfig { batch_size: 5, seed, ..TrainConfig::default() };
            let items: Vec<MnistItem> =
                (0..20).map(|i| MnistItem { image: [[0.0; 28]; 28], label: (i % 10) as u8 }).collect();
            training_loader::<NdArray>(DigitDataset::from_items(items), &cfg, device)
                .iter()
                .flat_map(|b| b.targets.into_data().convert::<i64>().to_vec::<i64>().unwrap())
                .collect()
        };

        assert_eq!(labels(3), labels(3));
        assert_ne!(labels(3), labels(4));
        assert_eq!(labels(3).len(), 20);
    }

    #[test]
    fn test_default_schedule_is_lenet() {
        let tmp = tempfile::tempdir().unwrap();
        let mut d = driver(new_model(), synthetic_items(4, 1), synthetic_items(4, 2), 4, tmp.path());
        for epoch in [1, 9, 10, 14, 15, 20] {
            assert_eq!(d.adjust_learning_rate(epoch), adjust_learning_rate(epoch));
        }
    }

    #[test]
    fn test_single_learnable_batch() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();

        let image = [[200.0f32; 28]; 28];
        let batch: Vec<MnistItem> = (0..4).map(|_| MnistItem { image, label: 3 }).collect();

        let model = new_model();
        let first = DigitBatcher::<NdArray>::new(device).batch(batch.clone());
        let (loss_before, _) = model.valid().forward_classification(first.images, first.targets);
        let loss_before: f64 = loss_before.into_scalar().elem::<f64>();

        let mut d = driver(model, batch.clone(), batch, 4, tmp.path());
        let report = d.run(1).unwrap();

        assert_eq!(report.epochs.len(), 1);
        assert_eq!(CheckpointManager::new(tmp.path()).unwrap().saved_epochs().unwrap(), vec![1]);

        let eval = report.epochs[0].eval;
        assert_eq!(eval.total, 4);
        assert!(eval.accuracy == 1.0 || eval.avg_loss < loss_before);
    }

    #[test]
    fn test_metrics_row_per_epoch() {
        let tmp = tempfile::tempdir().unwrap();
        let mut d = driver(new_model(), synthetic_items(4, 1), synthetic_items(4, 2), 4, tmp.path())
            .with_metrics(MetricsLogger::new(tmp.path()).unwrap());

        d.run(2).unwrap();

        let csv = std::fs::read_to_string(tmp.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.lines().nth(2).unwrap().starts_with("2,0.010000,"));
    }
}

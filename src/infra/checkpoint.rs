// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores LeNet weights with Burn's named
// MessagePack recorder at full precision.
//
// What gets written:
//   1. LeNet_{epoch}.mpk   - all learned parameters after that epoch
//   2. latest_epoch.json   - number of the last completed epoch
//   3. train_config.json   - the run configuration
//
// File layout:
//   {checkpoint_dir}/
//     LeNet_1.mpk
//     LeNet_2.mpk
//     ...
//     latest_epoch.json
//     train_config.json
//
// Every epoch gets its own file, nothing is pruned.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::LeNet;

const CHECKPOINT_PREFIX:    &str = "LeNet_";
const CHECKPOINT_EXTENSION: &str = "mpk";
const LATEST_EPOCH_FILE:    &str = "latest_epoch.json";
const CONFIG_FILE:          &str = "train_config.json";

type CheckpointRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Manages saving and loading of per-epoch model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the recorder writes for `epoch`, extension included.
    pub fn checkpoint_file(&self, epoch: usize) -> PathBuf {
        self.record_stem(epoch).with_extension(CHECKPOINT_EXTENSION)
    }

    // The recorder appends the extension itself.
    fn record_stem(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("{CHECKPOINT_PREFIX}{epoch}"))
    }

    /// Save model weights for `epoch` and advance the latest-epoch pointer.
    pub fn save_model<B: Backend>(&self, model: &LeNet<B>, epoch: usize) -> Result<PathBuf> {
        let file = self.checkpoint_file(epoch);
        if file.exists() {
            tracing::warn!("Replacing checkpoint left by an earlier run: '{}'", file.display());
        }

        CheckpointRecorder::new()
            .record(model.clone().into_record(), self.record_stem(epoch))
            .with_context(|| format!("Failed to save checkpoint to '{}'", file.display()))?;

        let latest_path = self.dir.join(LATEST_EPOCH_FILE);
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", latest_path.display()))?;

        tracing::debug!("Saved checkpoint: '{}'", file.display());
        Ok(file)
    }

    /// Load the weights of `epoch` (or of the latest epoch when `None`) into `model`.
    ///
    /// `model` must have the same architecture as the saved one.
    pub fn load_model<B: Backend>(
        &self,
        model:  LeNet<B>,
        epoch:  Option<usize>,
        device: &B::Device,
    ) -> Result<LeNet<B>> {
        let epoch = match epoch {
            Some(e) => e,
            None    => self.latest_epoch()?,
        };
        let file = self.checkpoint_file(epoch);

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CheckpointRecorder::new()
            .load(self.record_stem(epoch), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Has that epoch been trained?", file.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Epoch numbers that have a checkpoint file on disk, ascending.
    pub fn saved_epochs(&self) -> Result<Vec<usize>> {
        let mut epochs = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CHECKPOINT_EXTENSION) {
                continue;
            }
            let epoch = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix(CHECKPOINT_PREFIX))
                .and_then(|n| n.parse::<usize>().ok());
            if let Some(epoch) = epoch {
                epochs.push(epoch);
            }
        }
        epochs.sort_unstable();
        Ok(epochs)
    }

    /// Save the run configuration so `evaluate` can rebuild the model.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Run 'train' before 'evaluate'.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Read latest_epoch.json. Errors if no epoch has completed yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_EPOCH_FILE);
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'. Have you run 'train' first?", path.display()))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores everything a later `forecast` run needs
// to reproduce a trained model's output:
//
//   checkpoints/
//     model_epoch_10.mpk.gz   ← weights (CompactRecorder)
//     model_epoch_20.mpk.gz
//     ...
//     latest_epoch.json       ← number of the newest checkpoint
//     train_config.json       ← TrainConfig (architecture + data)
//     scaler.json             ← min-max fit from the train split
//
// The config is needed to rebuild a model with the same shape
// before the weights can be loaded into it. The scaler is needed
// because forecasts are produced in normalised units and have to
// be mapped back to °C with the exact training fit.
//
// CompactRecorder: MessagePack + gzip, half precision. Loading
// fails if the architecture does not match the record.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::scaler::MinMaxScaler;
use crate::ml::model::SeriesTransformer;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Write weights for `epoch` and move the latest pointer to it.
    pub fn save_model<B: Backend>(&self, model: &SeriesTransformer<B>, epoch: usize) -> Result<()> {
        // Recorder adds the extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the newest checkpoint into `model`.
    ///
    /// `model` must have been built from the saved config.
    pub fn load_model<B: Backend>(
        &self,
        model:  SeriesTransformer<B>,
        device: &B::Device,
    ) -> Result<SeriesTransformer<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'forecast'.",
                    path.display()
                )
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    pub fn save_scaler(&self, scaler: &MinMaxScaler) -> Result<()> {
        let path = self.dir.join("scaler.json");
        fs::write(&path, serde_json::to_string_pretty(scaler)?)
            .with_context(|| format!("Cannot write scaler to '{}'", path.display()))?;
        tracing::debug!(
            "Saved scaler (data range {:.3}..{:.3})",
            scaler.data_min, scaler.data_max
        );
        Ok(())
    }

    pub fn load_scaler(&self) -> Result<MinMaxScaler> {
        let path = self.dir.join("scaler.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read scaler from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed scaler in '{}'", path.display()))
    }

    /// Returns an error if training hasn't been run yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'latest_epoch.json'. \
                 Have you run 'train' first?"
            })?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

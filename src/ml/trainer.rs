// ============================================================
// Layer 5 — Training Loop
// ============================================================
// All mutable training state lives in one TrainingSession:
// model, optimiser, LR schedule and the causal-mask cache.
// Nothing is global, so two sessions never interfere.
//
// Per epoch e = 1 ..= epochs:
//
//   1. lr = scheduler.step()            (γ = 0.95; epoch 1 gets
//                                        the initial rate)
//   2. for offset in (0 .. |train| - 1).step_by(batch):
//        forward → MSE → backward → global-norm clip → AdamW step
//   3. e % plot_every == 0:
//        stepwise eval + prediction plot
//        200-step roll-forward plot
//        checkpoint
//      otherwise:
//        batched eval (batch 300), no plots
//   4. summary line + metrics.csv row
//
// Gradients are consumed by each optimiser step, so nothing
// accumulates across batches. A NaN/∞ loss aborts the run.
//
// Key Burn insight:
//   - Training runs on B (Autodiff<…>) for gradients
//   - model.valid() returns the model on B::InnerBackend,
//     where dropout is off and no graph is recorded
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::{anyhow, Result};
use std::time::Instant;
use burn::{
    lr_scheduler::{
        exponential::{ExponentialLrScheduler, ExponentialLrSchedulerConfig},
        LrScheduler,
    },
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::WindowBatcher, dataset::WindowDataset};
use crate::domain::error::ForecastError;
use crate::infra::{
    charts::ChartWriter,
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::evaluator::{evaluate, evaluate_stepwise};
use crate::ml::forecaster::{roll_forward, ModelPredictor};
use crate::ml::grad_clip::clip_global_norm;
use crate::ml::mask::MaskCache;
use crate::ml::model::SeriesTransformer;

/// Where a training run writes its side outputs.
pub struct TrainOutputs<'a> {
    pub checkpoints: &'a CheckpointManager,
    pub metrics:     &'a MetricsLogger,
    pub charts:      &'a ChartWriter,
}

// ─── TrainingSession ──────────────────────────────────────────────────────────
pub struct TrainingSession<B: AutodiffBackend, O> {
    model:     SeriesTransformer<B>,
    optim:     O,
    scheduler: ExponentialLrScheduler,
    masks:     MaskCache,
    batcher:   WindowBatcher<B>,
    lr:        f64,
    grad_clip: f64,
}

/// Build a fresh model and optimiser for `cfg`.
pub fn start_session<B: AutodiffBackend>(
    cfg:    &TrainConfig,
    device: &B::Device,
) -> Result<TrainingSession<B, impl Optimizer<SeriesTransformer<B>, B>>> {
    let model: SeriesTransformer<B> = cfg.model_config().init(device);
    tracing::info!(
        "Model ready: {} layer(s), feature_size={}, heads={}",
        cfg.num_layers, cfg.feature_size, cfg.num_heads
    );

    // AdamW: Adam with decoupled weight decay
    //   θ = θ - lr * (m̂ / (√v̂ + ε) + λθ)
    // Clipping is done over all parameters at once in train_epoch,
    // so the optimiser gets no per-tensor clipping of its own.
    let optim = AdamWConfig::new()
        .with_epsilon(1e-8)
        .with_weight_decay(cfg.weight_decay)
        .init::<B, SeriesTransformer<B>>();

    let scheduler = ExponentialLrSchedulerConfig::new(cfg.lr, cfg.lr_decay)
        .init()
        .map_err(|e| anyhow!("Invalid learning-rate schedule: {e}"))?;

    Ok(TrainingSession {
        model,
        optim,
        scheduler,
        masks:     MaskCache::new(),
        batcher:   WindowBatcher::new(device.clone(), cfg.batch_size),
        lr:        cfg.lr,
        grad_clip: cfg.grad_clip as f64,
    })
}

impl<B, O> TrainingSession<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<SeriesTransformer<B>, B>,
{
    /// Learning rate of the most recent epoch.
    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn model(&self) -> &SeriesTransformer<B> {
        &self.model
    }

    /// The current weights on the inner backend, ready for evaluation.
    pub fn valid_model(&self) -> SeriesTransformer<B::InnerBackend> {
        self.model.valid()
    }

    /// One pass over `train`. Returns the mean batch loss.
    pub fn train_epoch(&mut self, epoch: usize, train: &WindowDataset) -> Result<f64> {
        self.lr = self.scheduler.step();

        let set_len       = train.pair_count();
        let batch_size    = self.batcher.batch_size().max(1);
        let total_batches = set_len.saturating_sub(1).div_ceil(batch_size);
        let log_interval  = (set_len / batch_size / 5).max(1);

        let mut epoch_loss    = 0.0f64;
        let mut epoch_batches = 0usize;
        let mut window_loss   = 0.0f64;
        let mut window_start  = Instant::now();

        for (batch_idx, offset) in self.batcher.offsets(set_len).enumerate() {
            let batch = self.batcher.batch_at(train, offset)?;
            let mask  = self.masks.get(batch.window_len());
            let (loss, _) = self.model.forward_loss(batch.input, batch.target, mask);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                tracing::error!("Loss became {} at epoch {} batch {}", loss_val, epoch, batch_idx);
                return Err(ForecastError::NonFiniteLoss { epoch, batch: batch_idx }.into());
            }

            // Backward pass + clipped AdamW update
            let mut grads = GradientsParams::from_grads(loss.backward(), &self.model);
            let grad_norm = clip_global_norm::<B, _>(&self.model, &mut grads, self.grad_clip);
            tracing::trace!("batch {} gradient norm {:.4}", batch_idx, grad_norm);
            self.model = self.optim.step(self.lr, self.model.clone(), grads);

            epoch_loss    += loss_val;
            epoch_batches += 1;
            window_loss   += loss_val;

            if (batch_idx + 1) % log_interval == 0 {
                let ms_per_batch = window_start.elapsed().as_secs_f64() * 1000.0 / log_interval as f64;
                let cur_loss     = window_loss / log_interval as f64;
                tracing::info!(
                    "| epoch {:>3} | {:>5}/{:>5} batches | lr {:.6} | {:>6.2} ms | loss {:.5} | ppl {:>8.2}",
                    epoch, batch_idx + 1, total_batches, self.lr, ms_per_batch, cur_loss, cur_loss.exp()
                );
                window_loss  = 0.0;
                window_start = Instant::now();
            }
        }

        Ok(if epoch_batches > 0 { epoch_loss / epoch_batches as f64 } else { f64::NAN })
    }
}

// ─── Full run ─────────────────────────────────────────────────────────────────
/// Train for `cfg.epochs` epochs and return the final weights on
/// the inner backend.
pub fn run_training<B: AutodiffBackend>(
    cfg:     &TrainConfig,
    train:   &WindowDataset,
    val:     &WindowDataset,
    outputs: &TrainOutputs<'_>,
    device:  &B::Device,
) -> Result<SeriesTransformer<B::InnerBackend>> {
    B::seed(device, cfg.seed);
    let mut session    = start_session::<B>(cfg, device)?;
    let mut eval_masks = MaskCache::new();

    tracing::info!(
        "Training on {} windows, validating on {} (W={}, batch={})",
        train.pair_count(), val.pair_count(), train.window(), cfg.batch_size
    );

    for epoch in 1..=cfg.epochs {
        let started    = Instant::now();
        let train_loss = session.train_epoch(epoch, train)?;

        // dropout disabled, no autodiff graph
        let model_valid = session.valid_model();
        let plot_epoch  = epoch % cfg.plot_every == 0;

        let val_loss = if plot_epoch {
            let report = evaluate_stepwise(&model_valid, val, &mut eval_masks, device)?;
            outputs.charts.prediction_vs_truth(epoch, &report.truth, &report.predictions);

            if let Some(first) = val.pair(0) {
                let mut predictor = ModelPredictor::new(&model_valid, device.clone());
                let buffer = roll_forward(&mut predictor, &first.input, val.window(), cfg.future_steps)?;
                outputs.charts.future_forecast(epoch, &buffer, val.window());
            }
            report.loss
        } else {
            evaluate(&model_valid, val, cfg.eval_batch_size, &mut eval_masks, device)?
        };

        if plot_epoch || epoch == cfg.epochs {
            outputs.checkpoints.save_model(&model_valid, epoch)?;
            tracing::info!("Checkpoint saved for epoch {}", epoch);
        }

        let elapsed = started.elapsed().as_secs_f64();
        println!(
            "Epoch {:>3}/{} | time={:>6.2}s | lr={:.6} | train_loss={:.5} | val_loss={:.5} | val_ppl={:.2}",
            epoch, cfg.epochs, elapsed, session.lr(), train_loss, val_loss, val_loss.exp(),
        );
        outputs.metrics.log(&EpochMetrics::new(epoch, train_loss, val_loss, session.lr(), elapsed))?;
    }

    tracing::info!("Training complete!");
    Ok(session.valid_model())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use burn::backend::{Autodiff, NdArray};
    use tempfile::tempdir;

    type TestBackend = Autodiff<NdArray>;

    fn tiny_config() -> TrainConfig {
        TrainConfig {
            input_window: 8,
            batch_size:   4,
            epochs:       2,
            plot_every:   2,
            future_steps: 5,
            feature_size: 8,
            num_heads:    2,
            d_ff:         16,
            dropout:      0.0,
            ..TrainConfig::default()
        }
    }

    fn sine_sets(window: usize) -> (WindowDataset, WindowDataset) {
        let series: Vec<f32> = (0..60).map(|i| (i as f32 * 0.3).sin() * 0.8).collect();
        let (train, val) = series.split_at(45);
        (
            WindowDataset::from_series(train, window, 1).unwrap(),
            WindowDataset::from_series(val, window, 1).unwrap(),
        )
    }

    #[test]
    fn test_lr_decays_once_per_epoch() {
        let cfg    = tiny_config();
        let device = Default::default();
        let (train, _) = sine_sets(cfg.input_window);
        let mut session = start_session::<TestBackend>(&cfg, &device).unwrap();

        session.train_epoch(1, &train).unwrap();
        assert_relative_eq!(session.lr(), 0.005, max_relative = 1e-9);
        session.train_epoch(2, &train).unwrap();
        assert_relative_eq!(session.lr(), 0.005 * 0.95, max_relative = 1e-9);
    }

    #[test]
    fn test_train_epoch_updates_weights() {
        let cfg    = tiny_config();
        let device = Default::default();
        let (train, _) = sine_sets(cfg.input_window);
        let mut session = start_session::<TestBackend>(&cfg, &device).unwrap();

        let before: Vec<f32> = session.model().decoder.weight.val().into_data().to_vec().unwrap();
        let loss = session.train_epoch(1, &train).unwrap();
        let after: Vec<f32> = session.model().decoder.weight.val().into_data().to_vec().unwrap();

        assert!(loss.is_finite());
        assert_ne!(before, after);
    }

    #[test]
    fn test_nan_in_series_aborts_epoch() {
        let cfg    = tiny_config();
        let device = Default::default();
        let mut series: Vec<f32> = (0..30).map(|i| (i as f32 * 0.3).sin()).collect();
        series[0] = f32::NAN;
        let train = WindowDataset::from_series(&series, cfg.input_window, 1).unwrap();
        let mut session = start_session::<TestBackend>(&cfg, &device).unwrap();

        let err = session.train_epoch(1, &train).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ForecastError>(),
            Some(&ForecastError::NonFiniteLoss { epoch: 1, batch: 0 })
        );
    }

    #[test]
    fn test_end_to_end_run_writes_outputs() {
        let tmp    = tempdir().unwrap();
        let dir    = tmp.path().to_string_lossy().to_string();
        let cfg    = tiny_config();
        let device = Default::default();
        let (train, val) = sine_sets(cfg.input_window);

        let checkpoints = CheckpointManager::new(dir.clone()).unwrap();
        let metrics     = MetricsLogger::new(dir.clone()).unwrap();
        let charts      = ChartWriter::new(dir).unwrap();
        let outputs     = TrainOutputs { checkpoints: &checkpoints, metrics: &metrics, charts: &charts };

        let model = run_training::<TestBackend>(&cfg, &train, &val, &outputs, &device).unwrap();

        assert_eq!(checkpoints.latest_epoch().unwrap(), 2);
        let rows = metrics.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.train_loss.is_finite() && r.val_loss.is_finite()));
        assert!(tmp.path().join("transformer-epoch2.png").exists());
        assert!(tmp.path().join("transformer-future2.png").exists());

        let mut predictor = ModelPredictor::new(&model, device);
        let seed = &val.pair(0).unwrap().input;
        assert_eq!(roll_forward(&mut predictor, seed, 8, 3).unwrap().len(), 11);
    }
}

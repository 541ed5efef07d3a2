// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load observations              (Layer 4 - data)
//   Step 2: Select history + holdout       (Layer 4 - data)
//   Step 3: Chronological 85/15 split      (Layer 4 - data)
//   Step 4: Fit scaler on train only       (Layer 4 - data)
//   Step 5: Cut window sets                (Layer 4 - data)
//   Step 6: Save config + scaler           (Layer 6 - infra)
//   Step 7: Run training loop              (Layer 5 - ml)
//   Step 8: Forecast + score the holdout   (Layer 5 + 3)
//
// Every configuration problem (window too long for a split,
// empty data, short holdout, heads not dividing the width) is
// caught here before the first epoch.
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::application::forecast_use_case::forecast_months;
use crate::data::{
    dataset::WindowDataset,
    loader::CsvSeriesSource,
    scaler::{MinMaxScaler, DEFAULT_FEATURE_RANGE},
    splitter::{select_period, split_chronological},
    synthetic::{SyntheticSource, DEFAULT_SAMPLES},
    windowing::HORIZON,
};
use crate::domain::{
    error::ForecastError,
    observation::{values, Observation},
    score::ForecastScore,
    traits::SeriesSource,
};
use crate::infra::{
    charts::ChartWriter,
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
};
use crate::ml::model::SeriesTransformerConfig;
use crate::ml::positional::DEFAULT_MAX_LEN;
use crate::ml::trainer::{run_training, TrainOutputs};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run. Saved next to the checkpoints so
// `forecast` can rebuild the same model and the same history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    // data
    pub data_path:       String,
    pub synthetic:       bool,
    pub date_column:     String,
    pub value_column:    String,
    pub start_date:      NaiveDate,
    pub holdout_start:   NaiveDate,
    pub holdout_len:     usize,
    pub train_fraction:  f64,
    // outputs
    pub checkpoint_dir:  String,
    pub graph_dir:       String,
    // loop
    pub input_window:    usize,
    pub batch_size:      usize,
    pub eval_batch_size: usize,
    pub epochs:          usize,
    pub lr:              f64,
    pub lr_decay:        f64,
    pub grad_clip:       f32,
    pub weight_decay:    f32,
    pub plot_every:      usize,
    pub future_steps:    usize,
    pub seed:            u64,
    // model
    pub feature_size:    usize,
    pub num_heads:       usize,
    pub num_layers:      usize,
    pub d_ff:            usize,
    pub dropout:         f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:       "data/GlobalTemperatures.csv".to_string(),
            synthetic:       false,
            date_column:     "dt".to_string(),
            value_column:    "LandAverageTemperature".to_string(),
            start_date:      NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default(),
            holdout_start:   NaiveDate::from_ymd_opt(2014, 1, 1).unwrap_or_default(),
            holdout_len:     12,
            train_fraction:  0.85,
            checkpoint_dir:  "checkpoints".to_string(),
            graph_dir:       "graph".to_string(),
            input_window:    100,
            batch_size:      10,
            eval_batch_size: 300,
            epochs:          40,
            lr:              0.005,
            lr_decay:        0.95,
            grad_clip:       0.7,
            weight_decay:    0.01,
            plot_every:      10,
            future_steps:    200,
            seed:            0,
            feature_size:    250,
            num_heads:       10,
            num_layers:      1,
            d_ff:            2048,
            dropout:         0.1,
        }
    }
}

impl TrainConfig {
    /// Reject settings that would only fail later, mid-training.
    pub fn validate(&self) -> Result<(), ForecastError> {
        let invalid = |msg: String| -> Result<(), ForecastError> { Err(ForecastError::InvalidConfig(msg)) };

        if self.input_window == 0 {
            return invalid("input_window must be at least 1".into());
        }
        if self.input_window + HORIZON > DEFAULT_MAX_LEN {
            return invalid(format!(
                "input_window {} exceeds the positional table ({} positions)",
                self.input_window, DEFAULT_MAX_LEN
            ));
        }
        if self.batch_size == 0 || self.eval_batch_size == 0 {
            return invalid("batch sizes must be at least 1".into());
        }
        if self.epochs == 0 || self.plot_every == 0 {
            return invalid("epochs and plot_every must be at least 1".into());
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return invalid(format!("train_fraction {} must lie in (0, 1)", self.train_fraction));
        }
        if !(self.lr > 0.0 && self.lr <= 1.0) {
            return invalid(format!("lr {} must lie in (0, 1]", self.lr));
        }
        if !(self.lr_decay > 0.0 && self.lr_decay <= 1.0) {
            return invalid(format!("lr_decay {} must lie in (0, 1]", self.lr_decay));
        }
        if self.num_heads == 0 || self.feature_size % self.num_heads != 0 {
            return invalid(format!(
                "feature_size {} must be divisible by num_heads {}",
                self.feature_size, self.num_heads
            ));
        }
        if self.holdout_len == 0 {
            return invalid("holdout_len must be at least 1".into());
        }
        if self.start_date >= self.holdout_start {
            return invalid(format!(
                "start_date {} must precede holdout_start {}",
                self.start_date, self.holdout_start
            ));
        }
        Ok(())
    }

    pub fn model_config(&self) -> SeriesTransformerConfig {
        SeriesTransformerConfig::new()
            .with_feature_size(self.feature_size)
            .with_num_heads(self.num_heads)
            .with_num_layers(self.num_layers)
            .with_d_ff(self.d_ff)
            .with_dropout(self.dropout)
    }

    /// The configured data source.
    pub fn source(&self) -> Box<dyn SeriesSource> {
        if self.synthetic {
            Box::new(SyntheticSource::new(self.start_date, DEFAULT_SAMPLES, self.seed))
        } else {
            Box::new(CsvSeriesSource::new(&self.data_path, &self.date_column, &self.value_column))
        }
    }
}

/// What a finished training run reports back to the CLI.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub forecast: Vec<Observation>,
    pub holdout:  Vec<Observation>,
    pub score:    ForecastScore,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end on backend `B`.
    pub fn execute<B: AutodiffBackend>(&self, device: &B::Device) -> Result<TrainReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load observations ────────────────────────────────────────
        let observations = cfg.source().load()?;
        tracing::info!("Loaded {} observations", observations.len());

        // ── Step 2: History + holdout ────────────────────────────────────────
        let period = select_period(&observations, cfg.start_date, cfg.holdout_start, cfg.holdout_len);
        if period.history.is_empty() {
            return Err(ForecastError::EmptySeries)
                .with_context(|| format!("No observations between {} and {}", cfg.start_date, cfg.holdout_start));
        }
        if period.holdout.len() < cfg.holdout_len {
            return Err(ForecastError::InvalidConfig(format!(
                "holdout needs {} observations from {}, found {}",
                cfg.holdout_len, cfg.holdout_start, period.holdout.len()
            )).into());
        }
        let last_history = period.history[period.history.len() - 1].date;

        // ── Step 3: Chronological split ──────────────────────────────────────
        // No shuffling: validation must lie strictly after training in time
        let (train_obs, val_obs) = split_chronological(period.history.clone(), cfg.train_fraction);
        tracing::info!("Split: {} train, {} validation months", train_obs.len(), val_obs.len());
        let train_raw = values(&train_obs);
        let val_raw   = values(&val_obs);

        // ── Step 4: Normalise ────────────────────────────────────────────────
        // Fit once on train; validation and forecasts reuse the same fit
        let (scaler, train_series) = MinMaxScaler::fit_transform(&train_raw, DEFAULT_FEATURE_RANGE)
            .context("Cannot fit scaler on the training split")?;
        let val_series = scaler.transform(&val_raw);

        let charts = ChartWriter::new(&cfg.graph_dir)?;
        charts.train_val_overview(&train_obs, &val_obs);

        // ── Step 5: Window sets ──────────────────────────────────────────────
        let train_set = WindowDataset::from_series(&train_series, cfg.input_window, HORIZON)
            .context("Training split")?;
        let val_set   = WindowDataset::from_series(&val_series, cfg.input_window, HORIZON)
            .context("Validation split")?;
        for (name, set) in [("training", &train_set), ("validation", &val_set)] {
            if set.pair_count() < 2 {
                return Err(ForecastError::InvalidConfig(format!(
                    "{name} split yields {} window pair(s); at least 2 are needed",
                    set.pair_count()
                )).into());
            }
        }
        tracing::info!(
            "Window sets: {} train pairs, {} validation pairs",
            train_set.pair_count(), val_set.pair_count()
        );

        // ── Step 6: Save config + scaler for `forecast` ──────────────────────
        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir)?;
        checkpoints.save_config(cfg)?;
        checkpoints.save_scaler(&scaler)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 7: Train (Layer 5) ──────────────────────────────────────────
        let outputs = TrainOutputs { checkpoints: &checkpoints, metrics: &metrics, charts: &charts };
        let model   = run_training::<B>(cfg, &train_set, &val_set, &outputs, device)?;

        // ── Step 8: One-year holdout forecast ────────────────────────────────
        // Seed with the months just before the holdout
        let seed     = &val_series[val_series.len() - cfg.input_window..];
        let forecast = forecast_months(&model, &scaler, seed, last_history, cfg.holdout_len, device)?;

        let truth: Vec<f64> = values(&period.holdout);
        let predicted       = values(&forecast);
        let score           = ForecastScore::compute(&truth, &predicted)?;
        charts.holdout_forecast(&truth, &predicted);
        tracing::info!("Holdout forecast: RMSE={:.4} bias={:+.4}", score.rmse, score.bias);

        Ok(TrainReport { forecast, holdout: period.holdout, score })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = TrainConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.start_date, NaiveDate::from_ymd_opt(1900, 1, 1).unwrap());
        assert_eq!(cfg.holdout_start, NaiveDate::from_ymd_opt(2014, 1, 1).unwrap());
    }

    #[test]
    fn test_heads_must_divide_width() {
        let cfg = TrainConfig { feature_size: 250, num_heads: 8, ..TrainConfig::default() };
        assert!(matches!(cfg.validate(), Err(ForecastError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_batch_rejected() {
        let cfg = TrainConfig { batch_size: 0, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_window_beyond_positional_table_rejected() {
        let cfg = TrainConfig { input_window: DEFAULT_MAX_LEN, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_model_config_carries_hyperparameters() {
        let cfg   = TrainConfig { feature_size: 16, num_heads: 4, num_layers: 2, ..TrainConfig::default() };
        let model = cfg.model_config();
        assert_eq!(model.feature_size, 16);
        assert_eq!(model.num_heads, 4);
        assert_eq!(model.num_layers, 2);
        assert_eq!(model.d_ff, 2048);
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg  = TrainConfig { synthetic: true, seed: 7, ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"start_date\":\"1900-01-01\""));
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert!(back.synthetic);
        assert_eq!(back.seed, 7);
    }

    #[test]
    fn test_short_validation_split_rejected_before_training() {
        // 1990..2013 gives 288 months: 244 train, 44 validation < W + 3
        let tmp = tempdir().unwrap();
        let checkpoint_dir = tmp.path().join("checkpoints");
        let cfg = TrainConfig {
            synthetic:      true,
            start_date:     NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            input_window:   42,
            feature_size:   8,
            num_heads:      2,
            d_ff:           16,
            checkpoint_dir: checkpoint_dir.to_string_lossy().to_string(),
            graph_dir:      tmp.path().join("graph").to_string_lossy().to_string(),
            ..TrainConfig::default()
        };

        let err = TrainUseCase::new(cfg)
            .execute::<Autodiff<NdArray>>(&Default::default())
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<ForecastError>(), Some(ForecastError::InvalidConfig(_))));
        assert!(!checkpoint_dir.join("latest_epoch.json").exists());
        assert!(!checkpoint_dir.join("metrics.csv").exists());
    }
}

// ============================================================
// Layer 2 — Forecast Use Case
// ============================================================
// Reloads a finished training run and extends the series:
//
//   1. train_config.json → rebuild the model + data settings
//   2. scaler.json       → the exact train-split fit
//   3. latest checkpoint → weights
//   4. history           → last W months, normalised, as seed
//   5. roll forward `steps` months and map back to °C
//
// The forecast starts the month after the last history month,
// so with default settings it lines up with the holdout year
// and can be scored against it.

use anyhow::{Context, Result};
use burn::prelude::*;
use chrono::{Months, NaiveDate};
use std::path::{Path, PathBuf};

use crate::data::{scaler::MinMaxScaler, splitter::select_period};
use crate::domain::{
    error::ForecastError,
    observation::{values, Observation},
    score::ForecastScore,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::forecaster::{roll_forward, ModelPredictor};
use crate::ml::model::SeriesTransformer;

/// Roll `model` forward from a normalised `seed` and return dated
/// observations in °C, one per month after `last_date`.
pub fn forecast_months<B: Backend>(
    model:     &SeriesTransformer<B>,
    scaler:    &MinMaxScaler,
    seed:      &[f32],
    last_date: NaiveDate,
    steps:     usize,
    device:    &B::Device,
) -> Result<Vec<Observation>> {
    let mut predictor = ModelPredictor::new(model, device.clone());
    let buffer    = roll_forward(&mut predictor, seed, seed.len(), steps)?;
    let generated = scaler.inverse_transform(&buffer[seed.len()..]);

    generated
        .into_iter()
        .enumerate()
        .map(|(k, value)| {
            let date = last_date
                .checked_add_months(Months::new(k as u32 + 1))
                .with_context(|| format!("Date overflow {} months after {}", k + 1, last_date))?;
            Ok(Observation::new(date, value))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub forecast: Vec<Observation>,
    /// Present when the forecast overlaps the holdout months
    pub score:    Option<ForecastScore>,
    pub csv_path: PathBuf,
}

pub struct ForecastUseCase {
    checkpoint_dir: String,
    steps:          usize,
}

impl ForecastUseCase {
    pub fn new(checkpoint_dir: String, steps: usize) -> Self {
        Self { checkpoint_dir, steps }
    }

    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<ForecastReport> {
        let checkpoints = CheckpointManager::new(&self.checkpoint_dir)?;
        let cfg         = checkpoints.load_config()?;
        let scaler      = checkpoints.load_scaler()?;
        let model       = checkpoints.load_model(cfg.model_config().init::<B>(device), device)?;

        let observations = cfg.source().load()?;
        let period = select_period(&observations, cfg.start_date, cfg.holdout_start, cfg.holdout_len);
        let last_date = period
            .history
            .last()
            .map(|o| o.date)
            .ok_or(ForecastError::EmptySeries)
            .context("No history to seed the forecast from")?;

        let series = scaler.transform(&values(&period.history));
        if series.len() < cfg.input_window {
            return Err(ForecastError::LengthMismatch {
                expected: cfg.input_window,
                actual:   series.len(),
            })
            .context("History is shorter than one input window");
        }
        let seed = &series[series.len() - cfg.input_window..];

        tracing::info!("Forecasting {} months after {}", self.steps, last_date);
        let forecast = forecast_months(&model, &scaler, seed, last_date, self.steps, device)?;

        let overlap = forecast.len().min(period.holdout.len());
        let score = if overlap > 0 {
            Some(ForecastScore::compute(
                &values(&period.holdout[..overlap]),
                &values(&forecast[..overlap]),
            )?)
        } else {
            None
        };

        let csv_path = checkpoints.dir().join("forecast.csv");
        write_forecast(&csv_path, &forecast)?;

        Ok(ForecastReport { forecast, score, csv_path })
    }
}

fn write_forecast(path: &Path, forecast: &[Observation]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    for row in forecast {
        writer.serialize(row)?;
    }
    writer.flush()?;
    tracing::debug!("Wrote {} forecast rows to '{}'", forecast.len(), path.display());
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::ml::model::SeriesTransformerConfig;
    use burn::backend::{Autodiff, NdArray};
    use tempfile::tempdir;

    #[test]
    fn test_forecast_months_are_consecutive() {
        let device = Default::default();
        let model  = SeriesTransformerConfig::new()
            .with_feature_size(8)
            .with_num_heads(2)
            .with_d_ff(16)
            .with_max_len(16)
            .init::<NdArray>(&device);
        let scaler = MinMaxScaler::fit(&[0.0, 10.0], (-1.0, 1.0)).unwrap();
        let last   = NaiveDate::from_ymd_opt(2013, 12, 1).unwrap();

        let out = forecast_months(&model, &scaler, &[0.0, 0.5, -0.5, 0.2], last, 3, &device).unwrap();

        let dates: Vec<NaiveDate> = out.iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![
            NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2014, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2014, 3, 1).unwrap(),
        ]);
        assert!(out.iter().all(|o| o.value.is_finite()));
    }

    #[test]
    fn test_train_then_forecast_on_synthetic_series() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().to_string_lossy().to_string();
        let cfg = TrainConfig {
            synthetic:      true,
            start_date:     NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            checkpoint_dir: format!("{dir}/checkpoints"),
            graph_dir:      format!("{dir}/graph"),
            input_window:   12,
            batch_size:     16,
            epochs:         1,
            plot_every:     1,
            future_steps:   4,
            feature_size:   8,
            num_heads:      2,
            d_ff:           16,
            ..TrainConfig::default()
        };
        let device = Default::default();

        let report = TrainUseCase::new(cfg.clone())
            .execute::<Autodiff<NdArray>>(&device)
            .unwrap();
        assert_eq!(report.forecast.len(), 12);
        assert_eq!(report.holdout.len(), 12);
        assert_eq!(report.forecast[0].date, cfg.holdout_start);
        assert!(report.score.rmse.is_finite());
        assert!(tmp.path().join("graph/train_test_data.png").exists());
        assert!(tmp.path().join("graph/holdout_forecast.png").exists());

        let forecast = ForecastUseCase::new(cfg.checkpoint_dir.clone(), 6)
            .execute::<NdArray>(&device)
            .unwrap();
        assert_eq!(forecast.forecast.len(), 6);
        assert_eq!(forecast.forecast[0].date, cfg.holdout_start);
        assert!(forecast.score.is_some());
        assert!(forecast.csv_path.exists());

        // Same weights, scaler and seed as the end of training
        for (a, b) in forecast.forecast.iter().zip(&report.forecast) {
            assert!((a.value - b.value).abs() < 0.5);
        }
    }
}

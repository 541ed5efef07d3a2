// ============================================================
// Layer 4 — Min-Max Scaler
// ============================================================
// Maps raw temperatures into a fixed feature range (default
// [-1, 1]) and back again:
//
//   std    = (x - data_min) / (data_max - data_min)
//   scaled = std * (feature_max - feature_min) + feature_min
//
// Why normalise at all?
//   The model adds a sinusoidal positional encoding in [-1, 1]
//   to the input. Raw temperatures (roughly 0–15 °C) would
//   drown that signal out.
//
// Fit ONCE on the training split, then reuse the same params
// for validation, forecast seeds and for turning predictions
// back into °C. The params are serialisable so the `forecast`
// command can reload the exact fit used during training.
//
// A constant series has zero range; the range is treated as 1
// so transform never divides by zero.

use serde::{Deserialize, Serialize};

use crate::domain::error::ForecastError;

pub const DEFAULT_FEATURE_RANGE: (f64, f64) = (-1.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min:    f64,
    pub data_max:    f64,
    pub feature_min: f64,
    pub feature_max: f64,
}

impl MinMaxScaler {
    /// Learn data_min / data_max from `values`.
    pub fn fit(values: &[f64], feature_range: (f64, f64)) -> Result<Self, ForecastError> {
        if values.is_empty() {
            return Err(ForecastError::EmptySeries);
        }
        let (lo, hi) = feature_range;
        if lo >= hi {
            return Err(ForecastError::InvalidConfig(format!(
                "feature range ({lo}, {hi}) must be increasing"
            )));
        }
        let data_min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self { data_min, data_max, feature_min: lo, feature_max: hi })
    }

    /// Fit on `values` and return both the scaler and the scaled series.
    pub fn fit_transform(
        values:        &[f64],
        feature_range: (f64, f64),
    ) -> Result<(Self, Vec<f32>), ForecastError> {
        let scaler = Self::fit(values, feature_range)?;
        let scaled = scaler.transform(values);
        Ok((scaler, scaled))
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f32> {
        let scale = self.scale();
        values
            .iter()
            .map(|&x| ((x - self.data_min) * scale + self.feature_min) as f32)
            .collect()
    }

    pub fn inverse_transform(&self, values: &[f32]) -> Vec<f64> {
        let scale = self.scale();
        values
            .iter()
            .map(|&y| (y as f64 - self.feature_min) / scale + self.data_min)
            .collect()
    }

    fn scale(&self) -> f64 {
        let data_range = self.data_max - self.data_min;
        let data_range = if data_range == 0.0 { 1.0 } else { data_range };
        (self.feature_max - self.feature_min) / data_range
    }
}

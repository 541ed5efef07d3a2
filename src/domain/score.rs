// ============================================================
// Layer 3 — Forecast Scoring
// ============================================================
// Terminal reporting metrics for a forecast. Nothing here
// feeds back into training.
//
//   RMSE = sqrt( mean( (y_true - y_pred)^2 ) )
//   bias = mean(y_pred) - mean(y_true)
//
// A positive bias means the model runs warm.

use serde::{Deserialize, Serialize};

use crate::domain::error::ForecastError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastScore {
    pub rmse: f64,
    pub bias: f64,
}

impl ForecastScore {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Result<Self, ForecastError> {
        Ok(Self {
            rmse: rmse(y_true, y_pred)?,
            bias: bias(y_true, y_pred)?,
        })
    }
}

pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> Result<f64, ForecastError> {
    check_aligned(y_true, y_pred)?;
    let mse = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64;
    Ok(mse.sqrt())
}

pub fn bias(y_true: &[f64], y_pred: &[f64]) -> Result<f64, ForecastError> {
    check_aligned(y_true, y_pred)?;
    Ok(mean(y_pred) - mean(y_true))
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn check_aligned(y_true: &[f64], y_pred: &[f64]) -> Result<(), ForecastError> {
    if y_true.is_empty() {
        return Err(ForecastError::EmptySeries);
    }
    if y_true.len() != y_pred.len() {
        return Err(ForecastError::LengthMismatch {
            expected: y_true.len(),
            actual:   y_pred.len(),
        });
    }
    Ok(())
}

// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Failures that have a precise meaning for the forecaster.
// They are raised by the data and ml layers and converted
// into anyhow::Error at the application boundary with `?`.
//
// Configuration problems are caught before the first epoch
// so they never surface as a cryptic shape mismatch deep
// inside the training loop.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    /// The split is too short to cut even one full window pair from it
    #[error(
        "series of length {series_len} is too short for window {window} + horizon {horizon} \
         (need more than {} points)",
        window + horizon
    )]
    WindowTooLong {
        series_len: usize,
        window:     usize,
        horizon:    usize,
    },

    #[error("series is empty after cleaning")]
    EmptySeries,

    #[error("length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("batch at offset {offset} is empty (window set has {set_len} pairs)")]
    EmptyBatch { offset: usize, set_len: usize },

    #[error("training loss became non-finite at epoch {epoch}, batch {batch}")]
    NonFiniteLoss { epoch: usize, batch: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

// ============================================================
// Layer 4 — Period Selection & Train/Validation Splitter
// ============================================================
// Cuts the loaded observations into the pieces the pipeline
// needs:
//
//   start_date            holdout_start
//       │                       │
//   ────┼───────────────────────┼────────────┼──────
//       │  history              │ holdout    │
//       │  train (85%) │ val    │ (12 months)│
//
// Why no shuffling?
//   This is a time series. The validation split must come
//   strictly AFTER the training split, otherwise the model is
//   evaluated on months sandwiched between months it trained
//   on and the validation loss becomes optimistic.
//
// The holdout is never seen during training; it is the ground
// truth for the final multi-step forecast.
//
// Reference: Rust Book §8 (Vectors)

use chrono::NaiveDate;

use crate::domain::observation::Observation;

/// History (for train/val) and the months reserved for scoring.
#[derive(Debug, Clone)]
pub struct Period {
    pub history: Vec<Observation>,
    pub holdout: Vec<Observation>,
}

/// Select `[start, holdout_start)` as history and the first
/// `holdout_len` observations on or after `holdout_start`.
pub fn select_period(
    observations:  &[Observation],
    start:         NaiveDate,
    holdout_start: NaiveDate,
    holdout_len:   usize,
) -> Period {
    let history: Vec<Observation> = observations
        .iter()
        .filter(|o| o.date >= start && o.date < holdout_start)
        .copied()
        .collect();

    let holdout: Vec<Observation> = observations
        .iter()
        .filter(|o| o.date >= holdout_start)
        .take(holdout_len)
        .copied()
        .collect();

    tracing::debug!(
        "Selected {} history observations from {} and {} holdout observations from {}",
        history.len(), start, holdout.len(), holdout_start,
    );

    Period { history, holdout }
}

/// Split `samples` in order into (train, validation).
///
/// The first `floor(len * train_fraction)` items go to training,
/// the rest to validation.
///
/// # Example
/// ```ignore
/// let (train, val) = split_chronological((0..100).collect(), 0.85);
/// // train = 0..85, val = 85..100
/// ```
pub fn split_chronological<T>(mut samples: Vec<T>, train_fraction: f64) -> (Vec<T>, Vec<T>) {
    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).floor() as usize;

    // Clamp to valid range to avoid panics on tiny datasets
    let split_at = split_at.min(total);

    // split_off(n) removes elements [n..] from the Vec and returns them
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}

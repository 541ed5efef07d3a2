// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// we can swap implementations without changing the code
// that uses them:
//   - CsvSeriesSource and SyntheticSource both implement
//     SeriesSource; the use cases only see SeriesSource
//   - the trained transformer implements SequencePredictor,
//     and so can any stand-in model in tests
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::observation::Observation;

// ─── SeriesSource ─────────────────────────────────────────────────────────────
/// Any component that can produce a chronologically ordered,
/// gap-free list of observations.
pub trait SeriesSource {
    fn load(&self) -> Result<Vec<Observation>>;
}

// ─── SequencePredictor ────────────────────────────────────────────────────────
/// A next-step model over a window of normalised values.
///
/// `predict` returns one value per input position; the value at
/// position k is the model's guess for the step after `window[k]`.
/// Only the last one is used when rolling a forecast forward.
pub trait SequencePredictor {
    fn predict(&mut self, window: &[f32]) -> Result<Vec<f32>>;
}

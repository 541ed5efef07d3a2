// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a CSV of monthly readings to tensor batches.
//
//   GlobalTemperatures.csv  (or the synthetic generator)
//       │
//       ▼
//   CsvSeriesSource     → dated observations, empty rows dropped
//       │
//       ▼
//   select_period       → history [start, holdout) + holdout year
//       │
//       ▼
//   split_chronological → first 85% train, rest validation
//       │
//       ▼
//   MinMaxScaler        → [-1, 1], fit on train only
//       │
//       ▼
//   sliding_windows     → (input, target) pairs, shift = 1
//       │
//       ▼
//   WindowDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   WindowBatcher       → time-major [W, batch, 1] tensors
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets)

/// Reads dated observations from a CSV file
pub mod loader;

/// Seeded sine-mixture series for quick experiments
pub mod synthetic;

/// Period selection and chronological train/validation split
pub mod splitter;

/// Reversible min-max normalisation
pub mod scaler;

/// Sliding (input, target) window pairs
pub mod windowing;

/// Implements Burn's Dataset trait for window pairs
pub mod dataset;

/// Stacks window pairs into time-major tensor batches
pub mod batcher;

// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting outputs of a run that don't belong to any
// business layer:
//
//   checkpoint.rs — model weights (CompactRecorder), plus the
//                   TrainConfig and scaler as JSON so `forecast`
//                   can rebuild exactly what was trained
//
//   metrics.rs    — one CSV row per epoch (loss, lr, time)
//
//   charts.rs     — PNG line charts of predictions, forecasts
//                   and the train/validation split
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// PNG chart rendering
pub mod charts;

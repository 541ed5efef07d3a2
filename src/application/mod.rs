// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one user-level goal: train a model, or forecast with one.
//
// Rules for this layer:
//   - No tensor math or model code here
//   - No argument parsing or printing (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// The training workflow (and its TrainConfig)
pub mod train_use_case;

// Reload a trained run and forecast forward
pub mod forecast_use_case;

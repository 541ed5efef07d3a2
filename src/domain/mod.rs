// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, errors and traits that define the core
// concepts of the forecaster.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, traits and small math
//
// Everything here can be unit tested without a GPU or a
// data file on disk.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A dated scalar reading from the source series
pub mod observation;

// An (input, target) window pair cut from a normalised series
pub mod window;

// RMSE / bias scoring of a forecast against ground truth
pub mod score;

// Typed failures raised before or during training
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;

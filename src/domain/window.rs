// ============================================================
// Layer 3 — WindowPair Domain Type
// ============================================================
// The unit of supervision for the sequence model.
//
// With window W and horizon H = 1:
//   input  → series[start     .. start + W]
//   target → series[start + 1 .. start + W + 1]
//
// so target[k] is the value that follows input[k]. The model
// learns to emit target[k] at position k while only seeing
// input[0..=k] (the causal mask enforces the "only seeing").
//
// Example with W = 4:
//   series: 0 1 2 3 4 5
//   input:  0 1 2 3
//   target:   1 2 3 4

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowPair {
    /// W consecutive normalised values
    pub input: Vec<f32>,

    /// The same W positions shifted forward by the horizon
    pub target: Vec<f32>,
}

impl WindowPair {
    pub fn new(input: Vec<f32>, target: Vec<f32>) -> Self {
        debug_assert_eq!(input.len(), target.len());
        Self { input, target }
    }

    /// Window length W
    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

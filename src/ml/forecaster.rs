// ============================================================
// Layer 5 — Autoregressive Forecaster
// ============================================================
// Extends a series beyond the observed data by feeding the
// model's own predictions back in:
//
//   buffer_0     = seed
//   buffer_{s+1} = buffer_s ++ [ model(buffer_s[-W:])[-1] ]
//
// for s = 0 .. steps. From the second step on, the context
// window contains predictions rather than observations, so
// errors compound. There is no correction step.
//
// The loop is written against the SequencePredictor trait so
// the same code drives the trained transformer and any test
// stand-in.

use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::data::batcher::single_window;
use crate::domain::error::ForecastError;
use crate::domain::traits::SequencePredictor;
use crate::ml::mask::MaskCache;
use crate::ml::model::SeriesTransformer;

/// Roll `predictor` forward `steps` times from `seed`.
///
/// Returns the whole buffer: the seed followed by `steps`
/// generated values.
pub fn roll_forward<P: SequencePredictor>(
    predictor: &mut P,
    seed:      &[f32],
    window:    usize,
    steps:     usize,
) -> Result<Vec<f32>> {
    if window == 0 || seed.len() < window {
        return Err(ForecastError::LengthMismatch { expected: window, actual: seed.len() }.into());
    }

    let mut buffer = Vec::with_capacity(seed.len() + steps);
    buffer.extend_from_slice(seed);

    for step in 0..steps {
        let context = &buffer[buffer.len() - window..];
        let next = predictor
            .predict(context)?
            .last()
            .copied()
            .ok_or_else(|| anyhow!("model returned no prediction at step {step}"))?;
        buffer.push(next);
    }

    Ok(buffer)
}

/// Runs a trained transformer one window at a time.
pub struct ModelPredictor<'a, B: Backend> {
    model:  &'a SeriesTransformer<B>,
    masks:  MaskCache,
    device: B::Device,
}

impl<'a, B: Backend> ModelPredictor<'a, B> {
    pub fn new(model: &'a SeriesTransformer<B>, device: B::Device) -> Self {
        Self { model, masks: MaskCache::new(), device }
    }
}

impl<B: Backend> SequencePredictor for ModelPredictor<'_, B> {
    fn predict(&mut self, window: &[f32]) -> Result<Vec<f32>> {
        let input  = single_window::<B>(window, &self.device);
        let mask   = self.masks.get(window.len());
        let output = self.model.forward(input, mask);
        output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read model output: {e:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::SeriesTransformerConfig;
    use burn::backend::NdArray;

    /// Predicts "previous value + 1" at every position.
    struct PlusOne {
        calls: usize,
    }

    impl SequencePredictor for PlusOne {
        fn predict(&mut self, window: &[f32]) -> Result<Vec<f32>> {
            self.calls += 1;
            Ok(window.iter().map(|v| v + 1.0).collect())
        }
    }

    #[test]
    fn test_plus_one_model_extends_ramp() {
        let seed: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let mut model = PlusOne { calls: 0 };

        let buffer = roll_forward(&mut model, &seed, 100, 3).unwrap();

        let expected: Vec<f32> = (0..103).map(|i| i as f32).collect();
        assert_eq!(buffer, expected);
        assert_eq!(model.calls, 3);
    }

    #[test]
    fn test_context_is_last_window_only() {
        struct EchoFirst;
        impl SequencePredictor for EchoFirst {
            fn predict(&mut self, window: &[f32]) -> Result<Vec<f32>> {
                assert_eq!(window.len(), 3);
                Ok(vec![window[0]; window.len()])
            }
        }
        // Each step copies the value W positions back
        let buffer = roll_forward(&mut EchoFirst, &[9.0, 1.0, 2.0, 3.0], 3, 4).unwrap();
        assert_eq!(buffer, vec![9.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_zero_steps_returns_seed() {
        let buffer = roll_forward(&mut PlusOne { calls: 0 }, &[1.0, 2.0], 2, 0).unwrap();
        assert_eq!(buffer, vec![1.0, 2.0]);
    }

    #[test]
    fn test_short_seed_rejected() {
        assert!(roll_forward(&mut PlusOne { calls: 0 }, &[1.0], 2, 5).is_err());
    }

    #[test]
    fn test_transformer_predictor_is_deterministic() {
        let device = Default::default();
        let model  = SeriesTransformerConfig::new()
            .with_feature_size(8)
            .with_num_heads(2)
            .with_d_ff(16)
            .with_max_len(32)
            .init::<NdArray>(&device);

        let seed: Vec<f32> = (0..12).map(|i| (i as f32 * 0.5).cos()).collect();
        let mut predictor = ModelPredictor::new(&model, device);

        let first  = roll_forward(&mut predictor, &seed, 12, 5).unwrap();
        let second = roll_forward(&mut predictor, &seed, 12, 5).unwrap();
        assert_eq!(first.len(), 17);
        assert_eq!(first, second);
        assert_eq!(first[..12], seed[..]);
    }
}

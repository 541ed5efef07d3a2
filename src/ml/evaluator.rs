// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Held-out loss on the validation windows. Two flavours:
//
//   evaluate          — large batches (eval_batch_size), loss
//                       weighted by batch size:
//                         Σ count_b · mse_b / |set|
//                       Cheap; used on most epochs.
//
//   evaluate_stepwise — one window at a time, additionally
//                       collecting the LAST prediction and LAST
//                       target of every window. Those two
//                       sequences are a one-step-ahead forecast
//                       of the whole validation period and are
//                       what gets plotted.
//
// Both take the model on a plain (non-autodiff) backend: no
// gradients are tracked and dropout is inactive.

use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::data::batcher::WindowBatcher;
use crate::data::dataset::WindowDataset;
use crate::ml::mask::MaskCache;
use crate::ml::model::SeriesTransformer;

#[derive(Debug, Clone)]
pub struct StepwiseReport {
    pub loss:        f64,
    pub predictions: Vec<f32>,
    pub truth:       Vec<f32>,
}

pub fn evaluate<B: Backend>(
    model:      &SeriesTransformer<B>,
    dataset:    &WindowDataset,
    batch_size: usize,
    masks:      &mut MaskCache,
    device:     &B::Device,
) -> Result<f64> {
    let batcher = WindowBatcher::<B>::new(device.clone(), batch_size);
    let mut total_loss = 0.0f64;

    for offset in batcher.offsets(dataset.pair_count()) {
        let batch = batcher.batch_at(dataset, offset)?;
        let count = batch.count();
        let mask  = masks.get(batch.window_len());
        let (loss, _) = model.forward_loss(batch.input, batch.target, mask);
        total_loss += count as f64 * loss.into_scalar().elem::<f64>();
    }

    Ok(total_loss / dataset.pair_count() as f64)
}

pub fn evaluate_stepwise<B: Backend>(
    model:   &SeriesTransformer<B>,
    dataset: &WindowDataset,
    masks:   &mut MaskCache,
    device:  &B::Device,
) -> Result<StepwiseReport> {
    let batcher = WindowBatcher::<B>::new(device.clone(), 1);
    let window  = dataset.window();

    let mut total_loss  = 0.0f64;
    let mut predictions = Vec::new();
    let mut truth       = Vec::new();

    for offset in batcher.offsets(dataset.pair_count()) {
        let batch = batcher.batch_at(dataset, offset)?;
        let mask  = masks.get(batch.window_len());
        let (loss, output) = model.forward_loss(batch.input, batch.target, mask);
        total_loss += loss.into_scalar().elem::<f64>();

        let last: Vec<f32> = output
            .slice([window - 1..window, 0..1, 0..1])
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read model output: {e:?}"))?;
        predictions.extend(last);

        if let Some(target) = dataset.pair(offset).and_then(|p| p.target.last()) {
            truth.push(*target);
        }
    }

    let evaluated = predictions.len().max(1);
    Ok(StepwiseReport {
        loss: total_loss / evaluated as f64,
        predictions,
        truth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::SeriesTransformerConfig;
    use burn::backend::NdArray;

    fn setup() -> (SeriesTransformer<NdArray>, WindowDataset) {
        let device = Default::default();
        let model  = SeriesTransformerConfig::new()
            .with_feature_size(8)
            .with_num_heads(2)
            .with_d_ff(16)
            .with_max_len(32)
            .init::<NdArray>(&device);
        let series: Vec<f32> = (0..30).map(|i| (i as f32 * 0.3).sin()).collect();
        let ds = WindowDataset::from_series(&series, 6, 1).unwrap(); // 23 pairs
        (model, ds)
    }

    #[test]
    fn test_stepwise_collects_one_value_per_window() {
        let (model, ds) = setup();
        let mut masks = MaskCache::new();
        let report = evaluate_stepwise(&model, &ds, &mut masks, &Default::default()).unwrap();

        assert_eq!(report.predictions.len(), 22);
        assert_eq!(report.truth.len(), 22);
        assert_eq!(report.truth[0], ds.pair(0).unwrap().target[5]);
        assert!(report.loss.is_finite());
        assert_eq!(masks.builds(), 1);
    }

    #[test]
    fn test_batched_loss_matches_stepwise_weighting() {
        // Batch size only changes grouping, not the mean over windows
        let (model, ds) = setup();
        let mut masks = MaskCache::new();
        let device    = Default::default();

        let big   = evaluate(&model, &ds, 300, &mut masks, &device).unwrap();
        let small = evaluate(&model, &ds, 4, &mut masks, &device).unwrap();
        assert!((big - small).abs() < 1e-5);
    }
}

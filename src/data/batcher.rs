// ============================================================
// Layer 4 — Window Batcher (Batch Assembler)
// ============================================================
// Turns a run of consecutive window pairs into the two
// tensors the sequence model consumes.
//
// Batch size at offset i over a set of M pairs:
//
//   count = min(batch_size, M - 1 - i)
//
// The "- 1" means the very last pair of a set is never part
// of a batch; offsets run over [0, M - 1). The final batch of
// an epoch is usually shorter than batch_size.
//
// Layout: TIME-MAJOR, shape [W, count, 1]
//
//   pairs (count × W):        tensor (W × count × 1):
//     b0: a0 a1 a2              t0: a0 b0' c0'
//     b1: b0' b1' b2'    →      t1: a1 b1' c1'
//     b2: c0' c1' c2'           t2: a2 b2' c2'
//
// i.e. element [t, b, 0] = pairs[b].input[t]. Same for targets.
// The trailing axis of size 1 is the (univariate) feature.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataset::Dataset, prelude::*};

use crate::domain::error::ForecastError;
use crate::domain::window::WindowPair;

/// One mini-batch, time-major.
#[derive(Debug, Clone)]
pub struct WindowBatch<B: Backend> {
    /// [W, count, 1]
    pub input:  Tensor<B, 3>,
    /// [W, count, 1], input shifted forward by the horizon
    pub target: Tensor<B, 3>,
}

impl<B: Backend> WindowBatch<B> {
    pub fn window_len(&self) -> usize { self.input.dims()[0] }

    pub fn count(&self) -> usize { self.input.dims()[1] }
}

/// How many pairs a batch at `offset` holds.
pub fn batch_len(set_len: usize, offset: usize, batch_size: usize) -> usize {
    batch_size.min(set_len.saturating_sub(1).saturating_sub(offset))
}

/// Holds the target device so tensors are created on the
/// same GPU/CPU as the model.
#[derive(Clone, Debug)]
pub struct WindowBatcher<B: Backend> {
    device:     B::Device,
    batch_size: usize,
}

impl<B: Backend> WindowBatcher<B> {
    pub fn new(device: B::Device, batch_size: usize) -> Self {
        Self { device, batch_size }
    }

    pub fn batch_size(&self) -> usize { self.batch_size }

    /// Non-overlapping batch start offsets for a set of `set_len` pairs.
    pub fn offsets(&self, set_len: usize) -> impl Iterator<Item = usize> {
        (0..set_len.saturating_sub(1)).step_by(self.batch_size.max(1))
    }

    /// Assemble the batch starting at `offset`.
    pub fn batch_at<D: Dataset<WindowPair>>(
        &self,
        dataset: &D,
        offset:  usize,
    ) -> Result<WindowBatch<B>, ForecastError> {
        let count = batch_len(dataset.len(), offset, self.batch_size);
        if count == 0 {
            return Err(ForecastError::EmptyBatch { offset, set_len: dataset.len() });
        }

        let pairs: Vec<WindowPair> = (offset..offset + count)
            .filter_map(|i| dataset.get(i))
            .collect();

        let inputs:  Vec<&[f32]> = pairs.iter().map(|p| p.input.as_slice()).collect();
        let targets: Vec<&[f32]> = pairs.iter().map(|p| p.target.as_slice()).collect();

        Ok(WindowBatch {
            input:  self.to_tensor(&inputs)?,
            target: self.to_tensor(&targets)?,
        })
    }

    fn to_tensor(&self, rows: &[&[f32]]) -> Result<Tensor<B, 3>, ForecastError> {
        let window = rows.first().map_or(0, |r| r.len());
        let flat   = time_major(rows)?;
        Ok(Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([window, rows.len(), 1]))
    }
}

/// A single window as a batch of one: [W, 1, 1].
pub fn single_window<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 3> {
    Tensor::<B, 1>::from_floats(values, device).reshape([values.len(), 1, 1])
}

/// Flatten `rows` (count × W) into time-major order (W × count).
fn time_major(rows: &[&[f32]]) -> Result<Vec<f32>, ForecastError> {
    let window = rows.first().map_or(0, |r| r.len());
    if let Some(bad) = rows.iter().find(|r| r.len() != window) {
        return Err(ForecastError::LengthMismatch { expected: window, actual: bad.len() });
    }
    Ok((0..window)
        .flat_map(|t| rows.iter().map(move |row| row[t]))
        .collect())
}

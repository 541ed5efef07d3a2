// ============================================================
// Layer 5 — Causal Mask
// ============================================================
// A square (n × n) additive attention mask:
//
//        j=0   j=1   j=2
//   i=0   0    -inf  -inf
//   i=1   0     0    -inf
//   i=2   0     0     0
//
// Row i is the query position. Entries above the diagonal are
// -inf, so after softmax position i puts zero weight on every
// j > i: the prediction for step i+1 is computed only from
// steps 0..=i.
//
// `causal_mask` is a pure function. `MaskCache` keeps the last
// mask built and rebuilds it only when the requested size
// changes. During training the window length is constant, so
// the mask is built once per run.

use burn::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct CausalMask {
    size:   usize,
    values: Vec<f32>,
}

/// Build the n × n causal mask.
pub fn causal_mask(size: usize) -> CausalMask {
    let values = (0..size)
        .flat_map(|i| (0..size).map(move |j| if j <= i { 0.0 } else { f32::NEG_INFINITY }))
        .collect();
    CausalMask { size, values }
}

impl CausalMask {
    pub fn size(&self) -> usize { self.size }

    /// Additive mask value at (query i, key j).
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.size + j]
    }

    pub fn is_blocked(&self, i: usize, j: usize) -> bool {
        self.get(i, j) == f32::NEG_INFINITY
    }

    /// Boolean form for burn's attention, repeated over the batch:
    /// [batch, n, n], `true` where attention is blocked.
    pub fn to_tensor<B: Backend>(&self, batch: usize, device: &B::Device) -> Tensor<B, 3, Bool> {
        let blocked: Vec<bool> = (0..batch)
            .flat_map(|_| self.values.iter().map(|v| *v == f32::NEG_INFINITY))
            .collect();
        Tensor::<B, 3, Bool>::from_data(
            TensorData::new(blocked, [batch, self.size, self.size]),
            device,
        )
    }
}

/// Single-entry cache keyed by mask size.
#[derive(Debug, Default)]
pub struct MaskCache {
    current: Option<CausalMask>,
    builds:  usize,
}

impl MaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, size: usize) -> &CausalMask {
        if self.current.as_ref().is_some_and(|m| m.size != size) {
            self.current = None;
        }
        if self.current.is_none() {
            self.builds += 1;
            tracing::debug!("Building causal mask of size {}", size);
        }
        self.current.get_or_insert_with(|| causal_mask(size))
    }

    /// How many masks have been built so far.
    pub fn builds(&self) -> usize { self.builds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_mask_is_lower_triangular() {
        for n in [1, 2, 5, 17] {
            let m = causal_mask(n);
            for i in 0..n {
                for j in 0..n {
                    if j <= i {
                        assert_eq!(m.get(i, j), 0.0);
                    } else {
                        assert_eq!(m.get(i, j), f32::NEG_INFINITY);
                        assert!(m.is_blocked(i, j));
                    }
                }
            }
        }
    }

    #[test]
    fn test_cache_rebuilds_only_on_size_change() {
        let mut cache = MaskCache::new();
        assert_eq!(cache.get(100).size(), 100);
        assert_eq!(cache.get(100).size(), 100);
        assert_eq!(cache.builds(), 1);

        assert_eq!(cache.get(7).size(), 7);
        assert_eq!(cache.builds(), 2);

        assert_eq!(cache.get(100).size(), 100);
        assert_eq!(cache.builds(), 3);
    }

    #[test]
    fn test_bool_tensor_marks_future_positions() {
        let mask = causal_mask(3).to_tensor::<NdArray>(2, &Default::default());
        assert_eq!(mask.dims(), [2, 3, 3]);

        let flags: Vec<bool> = mask.into_data().to_vec().unwrap();
        let expected_one = [false, true, true, false, false, true, false, false, false];
        assert_eq!(flags[..9], expected_one);
        assert_eq!(flags[9..], expected_one);
    }
}

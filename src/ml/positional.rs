// ============================================================
// Layer 5 — Sinusoidal Positional Encoding
// ============================================================
// Self-attention is permutation-invariant, so position must be
// injected explicitly. For position p and channel c in a
// d-channel model:
//
//   pe(p, 2k)     = sin(p / 10000^(2k/d))
//   pe(p, 2k + 1) = cos(p / 10000^(2k/d))
//
// The table is computed once up to `max_len` positions, held
// as a constant tensor (not a parameter, never updated by the
// optimiser), and sliced to the incoming sequence length on
// every forward pass.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need §3.5

use burn::prelude::*;

pub const DEFAULT_MAX_LEN: usize = 5000;

/// Row-major [max_len, d_model] sinusoid table.
pub fn sinusoid_table(max_len: usize, d_model: usize) -> Vec<f32> {
    let mut table = vec![0.0f32; max_len * d_model];
    let log_base  = -(10000.0f64).ln() / d_model as f64;

    for p in 0..max_len {
        for k in (0..d_model).step_by(2) {
            let angle = p as f64 * (k as f64 * log_base).exp();
            table[p * d_model + k] = angle.sin() as f32;
            if k + 1 < d_model {
                table[p * d_model + k + 1] = angle.cos() as f32;
            }
        }
    }
    table
}

#[derive(Config, Debug)]
pub struct PositionalEncoderConfig {
    pub d_model: usize,
    #[config(default = 5000)]
    pub max_len: usize,
}

impl PositionalEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PositionalEncoder<B> {
        let table = sinusoid_table(self.max_len, self.d_model);
        let table = Tensor::<B, 1>::from_floats(table.as_slice(), device)
            .reshape([1, self.max_len, self.d_model]);
        PositionalEncoder { table }
    }
}

#[derive(Module, Debug)]
pub struct PositionalEncoder<B: Backend> {
    /// [1, max_len, d_model]
    table: Tensor<B, 3>,
}

impl<B: Backend> PositionalEncoder<B> {
    /// x: [batch, seq_len, d_model] → x + pe[0..seq_len]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq_len, d_model] = x.dims();
        let pe = self
            .table
            .clone()
            .slice([0..1, 0..seq_len, 0..d_model])
            .expand([batch, seq_len, d_model]);
        x + pe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use burn::backend::NdArray;

    #[test]
    fn test_position_zero_is_sin0_cos0() {
        let t = sinusoid_table(4, 6);
        assert_eq!(&t[0..6], &[0.0f32, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_matches_closed_form() {
        let d = 8;
        let t = sinusoid_table(50, d);
        for p in [1usize, 7, 49] {
            for k in 0..d / 2 {
                let angle = p as f64 / 10000f64.powf((2 * k) as f64 / d as f64);
                assert_abs_diff_eq!(t[p * d + 2 * k] as f64,     angle.sin(), epsilon = 1e-5);
                assert_abs_diff_eq!(t[p * d + 2 * k + 1] as f64, angle.cos(), epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_odd_width_does_not_overflow() {
        // Channel 4 of a 5-wide table is a sine with no cosine partner
        let t = sinusoid_table(3, 5);
        assert_eq!(t.len(), 15);
        let expected = (1.0 / 10000f64.powf(4.0 / 5.0)).sin();
        assert_abs_diff_eq!(t[5 + 4] as f64, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_forward_adds_table() {
        let device  = Default::default();
        let encoder = PositionalEncoderConfig::new(4).with_max_len(10).init::<NdArray>(&device);
        let x       = Tensor::<NdArray, 3>::zeros([2, 3, 4], &device);
        let out: Vec<f32> = encoder.forward(x).into_data().to_vec().unwrap();

        let table = sinusoid_table(3, 4);
        assert_eq!(out[..12], table[..]);
        assert_eq!(out[12..], table[..]);
    }
}

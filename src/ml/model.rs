use burn::{
    module::Param,
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::{MseLoss, Reduction},
        Dropout, DropoutConfig,
        Initializer,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::mask::CausalMask;
use crate::ml::positional::{PositionalEncoder, PositionalEncoderConfig};

/// Output projection weights start in [-OUTPUT_INIT_RANGE, OUTPUT_INIT_RANGE].
const OUTPUT_INIT_RANGE: f64 = 0.1;

// Config derive supplies Clone and serde; deriving them again conflicts.
#[derive(Config, Debug)]
pub struct SeriesTransformerConfig {
    /// Channels every time step is broadcast into (d_model)
    #[config(default = 250)]
    pub feature_size: usize,
    #[config(default = 10)]
    pub num_heads:    usize,
    #[config(default = 1)]
    pub num_layers:   usize,
    #[config(default = 2048)]
    pub d_ff:         usize,
    #[config(default = 0.1)]
    pub dropout:      f64,
    #[config(default = 5000)]
    pub max_len:      usize,
}

impl SeriesTransformerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SeriesTransformer<B> {
        let pos_encoder = PositionalEncoderConfig::new(self.feature_size)
            .with_max_len(self.max_len)
            .init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();

        let mut decoder = LinearConfig::new(self.feature_size, 1)
            .with_initializer(Initializer::Uniform {
                min: -OUTPUT_INIT_RANGE,
                max:  OUTPUT_INIT_RANGE,
            })
            .init(device);
        decoder.bias = Some(Param::from_tensor(Tensor::zeros([1], device)));

        SeriesTransformer {
            pos_encoder,
            layers,
            decoder,
            feature_size: self.feature_size,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.feature_size, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.feature_size, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.feature_size).init(device);
        let norm1   = LayerNormConfig::new(self.feature_size).init(device);
        let norm2   = LayerNormConfig::new(self.feature_size).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

/// Post-norm encoder layer: attention → add & norm → ReLU FFN → add & norm.
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// x: [batch, seq, d]; mask: [batch, seq, seq], true = blocked
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 3, Bool>) -> Tensor<B, 3> {
        let attn_output = self
            .self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_attn(mask))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            self.dropout.forward(relu(self.ffn_linear1.forward(x.clone())))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct SeriesTransformer<B: Backend> {
    pub pos_encoder:  PositionalEncoder<B>,
    pub layers:       Vec<EncoderBlock<B>>,
    pub decoder:      Linear<B>,
    pub feature_size: usize,
}

impl<B: Backend> SeriesTransformer<B> {
    /// src: [W, batch, 1] time-major → [W, batch, 1]
    ///
    /// Output position t is the prediction for step t + 1.
    /// `mask` must be the causal mask for W.
    pub fn forward(&self, src: Tensor<B, 3>, mask: &CausalMask) -> Tensor<B, 3> {
        let [seq_len, batch, _] = src.dims();
        debug_assert_eq!(mask.size(), seq_len, "causal mask built for a different window");
        let device = src.device();

        // Attention works batch-major; the scalar is broadcast across all
        // channels before the positional signal is added.
        let x = src
            .swap_dims(0, 1)
            .expand([batch, seq_len, self.feature_size]);
        let mut x = self.pos_encoder.forward(x);

        let attn_mask = mask.to_tensor::<B>(batch, &device);
        for layer in &self.layers {
            x = layer.forward(x, attn_mask.clone());
        }

        self.decoder.forward(x).swap_dims(0, 1) // [W, batch, 1]
    }

    /// Mean squared error of the forward pass against `target`.
    pub fn forward_loss(
        &self,
        input:  Tensor<B, 3>,
        target: Tensor<B, 3>,
        mask:   &CausalMask,
    ) -> (Tensor<B, 1>, Tensor<B, 3>) {
        let output = self.forward(input, mask);
        let loss   = MseLoss::new().forward(output.clone(), target, Reduction::Mean);
        (loss, output)
    }
}

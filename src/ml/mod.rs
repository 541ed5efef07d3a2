// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that touches the sequence model lives here.
//
//   mask.rs       — causal mask (pure) + single-entry cache
//   positional.rs — fixed sinusoidal position table
//   model.rs      — encoder-only transformer: scalar → d_model
//                   broadcast, positional add, N masked
//                   self-attention layers, linear head → 1
//   grad_clip.rs  — global gradient-norm clipping
//   trainer.rs    — TrainingSession: AdamW, clipping, LR decay,
//                   periodic evaluation, checkpoints
//   evaluator.rs  — batched and stepwise validation loss
//   forecaster.rs — autoregressive roll-forward
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

pub mod mask;

pub mod positional;

/// Transformer encoder over a univariate series
pub mod model;

pub mod grad_clip;

/// Epoch loop with validation and checkpointing
pub mod trainer;

pub mod evaluator;

/// Feeds predictions back in to extend a forecast
pub mod forecaster;

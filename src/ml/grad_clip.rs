// ============================================================
// Layer 5 — Global Gradient-Norm Clipping
// ============================================================
// Treats every parameter gradient of the model as one long
// vector and rescales them together:
//
//   total  = sqrt( Σ_p ‖g_p‖² )
//   factor = min(1, max_norm / total)
//   g_p   ← g_p · factor            for every parameter p
//
// Direction across parameters is preserved. Clipping each
// tensor by its own norm would not bound the joint update:
// two gradients of norm 0.6 each pass a per-tensor 0.7 limit
// while their joint norm is 0.85.
//
// Reference: Pascanu et al. (2013) On the difficulty of training RNNs

use std::marker::PhantomData;
use burn::{
    module::{AutodiffModule, ModuleVisitor, Param},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

/// Rescale `grads` so their joint L2 norm is at most `max_norm`.
/// Returns the norm measured before clipping.
pub fn clip_global_norm<B, M>(module: &M, grads: &mut GradientsParams, max_norm: f64) -> f64
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut squared = SquaredNorm::<B> { grads: &*grads, total: 0.0, backend: PhantomData };
    module.visit(&mut squared);
    let total = squared.total.sqrt();

    if total.is_finite() && total > max_norm {
        let mut rescale = Rescale::<B> { grads, factor: max_norm / total, backend: PhantomData };
        module.visit(&mut rescale);
    }
    total
}

struct SquaredNorm<'a, B: AutodiffBackend> {
    grads:   &'a GradientsParams,
    total:   f64,
    backend: PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for SquaredNorm<'_, B> {
    fn visit_float<const D: usize>(&mut self, param: &Param<Tensor<B, D>>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(param.id) {
            self.total += grad.powf_scalar(2.0).sum().into_scalar().elem::<f64>();
        }
    }
}

struct Rescale<'a, B: AutodiffBackend> {
    grads:   &'a mut GradientsParams,
    factor:  f64,
    backend: PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for Rescale<'_, B> {
    fn visit_float<const D: usize>(&mut self, param: &Param<Tensor<B, D>>) {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(param.id) {
            self.grads.register::<B::InnerBackend, D>(param.id, grad.mul_scalar(self.factor));
        }
    }
}

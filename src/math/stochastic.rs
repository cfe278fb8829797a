//! Logistic activation and Bernoulli sampling of feature maps

use ndarray::{Array, ArrayBase, Data, Dimension};
use rand::Rng;

/// Logistic function `1 / (1 + e^-x)`
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Apply the logistic function element-wise
pub fn logistic<S, D>(data: &ArrayBase<S, D>) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    data.mapv(sigmoid)
}

/// Apply the logistic function element-wise, reusing the buffer
pub fn logistic_in_place<D: Dimension>(data: &mut Array<f32, D>) {
    data.mapv_inplace(sigmoid);
}

/// Sample binary units from activation probabilities
///
/// Each element draws a fresh uniform value in `[0, 1)` and becomes `1.0` when
/// its probability exceeds the draw, `0.0` otherwise.
pub fn bernoulli<S, D, R>(probabilities: &ArrayBase<S, D>, rng: &mut R) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
    R: Rng + ?Sized,
{
    probabilities.mapv(|p| if p > rng.random::<f32>() { 1.0 } else { 0.0 })
}

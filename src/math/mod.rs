//! Numerical kernels shared by the layers

/// Valid cross-correlation, depth-aware variants and kernel flipping
pub mod convolution;
/// Nearest-neighbour resampling of square maps
pub mod resize;
/// Logistic activation and Bernoulli sampling
pub mod stochastic;

//! Stacked convolutional restricted Boltzmann machines trained by contrastive divergence
//!
//! Layers learn local filters from small square images, max pooling shrinks their
//! hidden maps between layers, and the flattened output of the last layer is
//! scored by clustering feature vectors and measuring label agreement.

#![deny(unsafe_code)]

/// Label-driven and LBG clustering with nearest-center evaluation
pub mod cluster;
/// Input/output operations and error handling
pub mod io;
/// Convolution, activation and resampling kernels
pub mod math;
/// CRBM layers, pooling and the stacked pipeline
pub mod model;

pub use io::error::{CrbmError, Result};

//! CRBM layers, pooling, the dense RBM stage and the stacked training pipeline

/// Border-preserving assembly of visible reconstructions
pub mod compositor;
/// Single CRBM layer and its contrastive-divergence step
pub mod crbm;
/// Filter bank owned by a layer
pub mod filter_bank;
/// Stacked layer training and feature extraction
pub mod pipeline;
/// Max pooling with optional winner-take-all suppression
pub mod pooling;
/// Dense RBM reducing flattened features
pub mod rbm;
/// Conversions between flat arrays, grids and channel stacks
pub mod sample;
/// Epoch budget and convergence tracking
pub mod stopping;

pub use crbm::{Crbm, CrbmConfig};
pub use pipeline::{DenseConfig, LayerConfig, PipelineConfig, StackedPipeline};
pub use rbm::Rbm;

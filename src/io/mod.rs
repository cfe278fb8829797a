//! Thin input/output glue around the core

/// Command-line arguments and the training runner
pub mod cli;
/// Default constants
pub mod configuration;
/// Labeled sample loading from image directories
pub mod dataset;
/// Error taxonomy and context helpers
pub mod error;
/// PNG export of feature maps
pub mod image;
/// Per-layer progress bars
pub mod progress;

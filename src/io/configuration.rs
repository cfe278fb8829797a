//! Training constants and runtime configuration defaults

// Layer shape used for handwritten digit features
/// Number of filters per layer
pub const DEFAULT_FILTER_COUNT: usize = 15;
/// Side length of each filter kernel
pub const DEFAULT_FILTER_EDGE_LENGTH: usize = 5;
/// Side length of the pooling blocks after each layer
pub const DEFAULT_POOLING_SIZE: usize = 2;

// Sample preparation
/// Side length images are resampled to before padding
pub const DEFAULT_EDGE_LENGTH: usize = 28;
/// Zero border added around every sample so filtered maps keep the image size
pub const DEFAULT_PADDING: usize = 2;
/// Lower end of the pixel value range
pub const DEFAULT_MIN_DATA: f32 = 0.0;
/// Upper end of the pixel value range
pub const DEFAULT_MAX_DATA: f32 = 1.0;
/// Grey level above which a binarized pixel is set
pub const BINARIZE_THRESHOLD: f32 = 0.5;
/// File extensions accepted as samples
pub const SAMPLE_EXTENSIONS: [&str; 3] = ["png", "jpg", "gif"];
/// Separator ending the label part of a sample file name
pub const LABEL_SEPARATOR: char = '_';

// Training
/// Epoch budget per layer
pub const DEFAULT_EPOCHS: usize = 100;
/// Contrastive-divergence learning rate
pub const DEFAULT_LEARNING_RATE: f32 = 0.01;
/// Scale of the uniform weight initialisation
pub const DEFAULT_WEIGHT_SCALE: f32 = 1.0;
/// Fixed seed for reproducible training
pub const DEFAULT_SEED: u64 = 42;
/// Scale of the uniform `[0, 1)` initialisation of dense RBM weights
pub const DENSE_WEIGHT_SCALE: f32 = 0.01;

// Clustering
/// Upper bound on LBG clusters
pub const DEFAULT_MAX_CLUSTERS: usize = 64;

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

//! Clustering of feature vectors and label-agreement scoring

/// Cluster of member vectors with center and intra-cluster distance
// Named after its one type, like the other modules here
#[allow(clippy::module_inception)]
pub mod cluster;
/// Counts of actual versus predicted labels
pub mod confusion;
/// Label-driven clusters, majority labelling and nearest-center evaluation
pub mod evaluation;
/// Unsupervised cluster growth by LBG splitting
pub mod lbg;

pub use cluster::Cluster;
pub use evaluation::{Evaluation, check_clusters, label_clusters};
pub use lbg::{LbgConfig, split_clusters};

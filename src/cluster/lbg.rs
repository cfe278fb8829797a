//! Unsupervised cluster growth by LBG splitting
//!
//! Starting from one cluster over the whole data set, the cluster with the
//! largest total distance is split into two centers offset symmetrically around
//! its own. Every vector is then reassigned to its nearest center and centers
//! are recomputed until assignments settle. Splitting stops once the summed
//! distance is at or below the threshold, or the cluster budget is spent.

use ndarray::Array1;
use rand::Rng;
use tracing::{debug, warn};

use crate::cluster::cluster::{Cluster, check_dimensions, euclidean_distance, total_distance};
use crate::io::configuration::DEFAULT_MAX_CLUSTERS;
use crate::io::error::{Result, empty_data_set, invalid_parameter};

/// Parameters of the splitting loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LbgConfig {
    /// Summed intra-cluster distance at which splitting stops
    pub threshold: f32,
    /// Upper bound on the number of clusters
    pub max_clusters: usize,
    /// Largest per-component offset applied when splitting a center
    pub perturbation: f32,
    /// Reassignment passes allowed after each split
    pub refinement_passes: usize,
}

impl LbgConfig {
    /// Default budget and perturbation for a distance threshold
    pub const fn new(threshold: f32) -> Self {
        Self {
            threshold,
            max_clusters: DEFAULT_MAX_CLUSTERS,
            perturbation: 1e-3,
            refinement_passes: 32,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(invalid_parameter(
                "threshold",
                &self.threshold,
                &"must be finite and non-negative",
            ));
        }
        if self.max_clusters == 0 {
            return Err(invalid_parameter(
                "max_clusters",
                &self.max_clusters,
                &"must be positive",
            ));
        }
        if !self.perturbation.is_finite() || self.perturbation <= 0.0 {
            return Err(invalid_parameter(
                "perturbation",
                &self.perturbation,
                &"must be finite and positive",
            ));
        }
        Ok(())
    }
}

/// Grow clusters over `data` by repeated splitting
///
/// # Errors
///
/// Returns `EmptyDataSet` for no vectors, `ShapeMismatch` if vector lengths
/// differ, or `InvalidParameter` for an invalid configuration
pub fn split_clusters<R: Rng + ?Sized>(
    data: &[Array1<f32>],
    config: &LbgConfig,
    rng: &mut R,
) -> Result<Vec<Cluster>> {
    if data.is_empty() {
        return Err(empty_data_set("split_clusters"));
    }
    config.validate()?;
    let dimension = check_dimensions(data, "split_clusters")?;

    let mut clusters = vec![Cluster::with_members((0..data.len()).collect(), data)];
    // Empty clusters are dropped after refinement, so a split can fail to grow the set
    let mut attempts = 0;

    while total_distance(&clusters) > config.threshold
        && clusters.len() < config.max_clusters
        && attempts < 4 * config.max_clusters
    {
        attempts += 1;

        let Some((worst, center)) = clusters
            .iter()
            .enumerate()
            .filter(|(_, cluster)| cluster.total_distance() > 0.0)
            .max_by(|(_, a), (_, b)| a.total_distance().total_cmp(&b.total_distance()))
            .and_then(|(index, cluster)| cluster.center().map(|center| (index, center.clone())))
        else {
            break;
        };

        let offset = Array1::from_shape_fn(dimension, |_| config.perturbation * rng.random::<f32>());

        let mut centers: Vec<Array1<f32>> = clusters
            .iter()
            .filter_map(|cluster| cluster.center().cloned())
            .collect();
        if let Some(slot) = centers.get_mut(worst) {
            *slot = &center + &offset;
        }
        centers.push(&center - &offset);

        clusters = refine(data, centers, config.refinement_passes, rng);
        debug!(
            clusters = clusters.len(),
            total_distance = total_distance(&clusters),
            "LBG split finished"
        );
    }

    let remaining = total_distance(&clusters);
    if remaining > config.threshold {
        warn!(
            clusters = clusters.len(),
            attempts,
            total_distance = remaining,
            threshold = config.threshold,
            "LBG stopped above threshold"
        );
    }

    Ok(clusters)
}

/// Index of the nearest center, first one on ties
fn nearest_center(vector: &Array1<f32>, centers: &[Array1<f32>]) -> usize {
    centers
        .iter()
        .enumerate()
        .map(|(index, center)| (index, euclidean_distance(&center.view(), &vector.view())))
        .fold((0, f32::INFINITY), |best, candidate| {
            if candidate.1 < best.1 { candidate } else { best }
        })
        .0
}

/// Lloyd iterations from the given centers until assignments settle
///
/// Centers that attract no vectors are reseeded on a random data vector.
fn refine<R: Rng + ?Sized>(
    data: &[Array1<f32>],
    mut centers: Vec<Array1<f32>>,
    passes: usize,
    rng: &mut R,
) -> Vec<Cluster> {
    let mut assignment: Vec<usize> = Vec::new();
    let mut clusters = Vec::new();

    for _ in 0..passes.max(1) {
        let next: Vec<usize> = data
            .iter()
            .map(|vector| nearest_center(vector, &centers))
            .collect();
        let mut changed = next != assignment;
        assignment = next;

        let mut members = vec![Vec::new(); centers.len()];
        for (index, &center) in assignment.iter().enumerate() {
            if let Some(group) = members.get_mut(center) {
                group.push(index);
            }
        }
        clusters = members
            .into_iter()
            .map(|group| Cluster::with_members(group, data))
            .collect::<Vec<_>>();

        for (index, (cluster, center)) in clusters.iter().zip(centers.iter_mut()).enumerate() {
            match cluster.center() {
                Some(mean) => center.assign(mean),
                None => {
                    let seed = rng.random_range(0..data.len());
                    if let Some(vector) = data.get(seed) {
                        center.assign(vector);
                    }
                    warn!(cluster = index, seed, "Reseeded empty cluster");
                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }

    clusters.retain(|cluster| !cluster.is_empty());
    clusters
}

//! Label-driven cluster construction and nearest-center evaluation

use std::collections::{BTreeSet, HashMap};

use ndarray::{Array1, ArrayView1};
use tracing::{debug, info};

use crate::cluster::cluster::{Cluster, check_dimensions};
use crate::cluster::confusion::ConfusionMatrix;
use crate::io::error::{Result, empty_data_set, shape_mismatch};

/// Scores of a labeled test set against labeled clusters
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Number of evaluated vectors
    pub samples: usize,
    /// Vectors whose nearest cluster carries a different label
    pub misclassified: usize,
    /// `misclassified / samples`
    pub misclassification_rate: f32,
    /// Mean 1-based rank of the true label among clusters sorted by distance
    pub mean_rank: f32,
    /// Mean of `1 / rank`, counting absent labels as zero
    pub mean_reciprocal_rank: f32,
    /// Actual versus predicted labels
    pub confusion: ConfusionMatrix,
}

fn check_labels(data: &[Array1<f32>], labels: &[String], operation: &'static str) -> Result<()> {
    if data.is_empty() {
        return Err(empty_data_set(operation));
    }
    if data.len() != labels.len() {
        return Err(shape_mismatch(
            operation,
            &format!("{} labels", data.len()),
            &labels.len(),
        ));
    }
    check_dimensions(data, operation).map(|_| ())
}

/// One cluster per distinct label, in order of first appearance
///
/// # Errors
///
/// Returns `EmptyDataSet` for no vectors, or `ShapeMismatch` if the label count
/// or vector lengths differ
pub fn label_clusters(data: &[Array1<f32>], labels: &[String]) -> Result<Vec<Cluster>> {
    check_labels(data, labels, "label_clusters")?;

    let mut clusters: Vec<Cluster> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (index, label) in labels.iter().enumerate() {
        let position = *positions.entry(label.as_str()).or_insert_with(|| {
            clusters.push(Cluster::default().with_label(label.clone()));
            clusters.len() - 1
        });
        if let Some(cluster) = clusters.get_mut(position) {
            cluster.add_member(index);
        }
    }

    for cluster in &mut clusters {
        cluster.recompute(data);
    }

    Ok(clusters)
}

/// Label every cluster with the most frequent label among its members
///
/// Ties go to the label seen first among the members; clusters without
/// members lose their label.
pub fn assign_majority_labels(clusters: &mut [Cluster], labels: &[String]) {
    for cluster in clusters.iter_mut() {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for label in cluster.members().iter().filter_map(|&index| labels.get(index)) {
            match counts.iter_mut().find(|(seen, _)| *seen == label.as_str()) {
                Some((_, count)) => *count += 1,
                None => counts.push((label.as_str(), 1)),
            }
        }

        let majority = counts
            .iter()
            .fold(None::<(&str, usize)>, |best, &(label, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((label, count)),
            })
            .map(|(label, _)| label.to_string());
        cluster.set_label(majority);
    }
}

/// Clusters ordered by ascending distance from `vector`, as `(index, distance)`
///
/// Ties keep collection order.
///
/// # Errors
///
/// Returns `DegenerateCluster` for a cluster without center, or
/// `ShapeMismatch` if the vector length differs from the centers
pub fn rank_clusters(clusters: &[Cluster], vector: &ArrayView1<'_, f32>) -> Result<Vec<(usize, f32)>> {
    let mut ranked = clusters
        .iter()
        .enumerate()
        .map(|(index, cluster)| {
            cluster.require_center(index)?;
            cluster
                .distance_to_center(vector)
                .map(|distance| (index, distance))
        })
        .collect::<Result<Vec<_>>>()?;
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(ranked)
}

/// Index of the cluster nearest to `vector`
///
/// # Errors
///
/// Returns `EmptyDataSet` if there are no clusters, plus the errors of
/// [`rank_clusters`]
pub fn nearest_cluster(clusters: &[Cluster], vector: &ArrayView1<'_, f32>) -> Result<usize> {
    rank_clusters(clusters, vector)?
        .first()
        .map(|&(index, _)| index)
        .ok_or_else(|| empty_data_set("nearest_cluster"))
}

/// Score labeled test vectors against labeled clusters
///
/// The prediction for a vector is the label of its nearest cluster. The rank of
/// a vector is the 1-based position of the first cluster carrying its true
/// label; a label no cluster carries ranks after every cluster.
///
/// # Errors
///
/// Returns `EmptyDataSet` for no vectors or no clusters, `ShapeMismatch` if the
/// label count or vector lengths differ, or `DegenerateCluster` for a cluster
/// without center
pub fn check_clusters(
    clusters: &[Cluster],
    data: &[Array1<f32>],
    labels: &[String],
) -> Result<Evaluation> {
    check_labels(data, labels, "check_clusters")?;
    if clusters.is_empty() {
        return Err(empty_data_set("check_clusters"));
    }

    let classes: BTreeSet<&str> = clusters
        .iter()
        .filter_map(Cluster::label)
        .chain(labels.iter().map(String::as_str))
        .collect();
    let mut confusion = ConfusionMatrix::new(classes);

    let mut misclassified = 0;
    let mut rank_sum = 0usize;
    let mut reciprocal_sum = 0.0f32;

    for (vector, actual) in data.iter().zip(labels) {
        let ranked = rank_clusters(clusters, &vector.view())?;

        let predicted = ranked
            .first()
            .and_then(|&(index, _)| clusters.get(index))
            .and_then(Cluster::label);

        let rank = ranked
            .iter()
            .position(|&(index, _)| {
                clusters
                    .get(index)
                    .and_then(Cluster::label)
                    .is_some_and(|label| label == actual)
            })
            .map(|position| position + 1);

        rank_sum += rank.unwrap_or(clusters.len() + 1);
        reciprocal_sum += rank.map_or(0.0, |r| 1.0 / r as f32);

        match predicted {
            Some(label) => {
                if label != actual {
                    misclassified += 1;
                    debug!(actual = actual.as_str(), predicted = label, "Misclassified vector");
                }
                confusion.add_entry(actual, label);
            }
            None => misclassified += 1,
        }
    }

    let samples = data.len();
    let evaluation = Evaluation {
        samples,
        misclassified,
        misclassification_rate: misclassified as f32 / samples as f32,
        mean_rank: rank_sum as f32 / samples as f32,
        mean_reciprocal_rank: reciprocal_sum / samples as f32,
        confusion,
    };

    info!(
        samples,
        misclassified,
        error = evaluation.misclassification_rate,
        mean_rank = evaluation.mean_rank,
        "Cluster check finished"
    );

    Ok(evaluation)
}

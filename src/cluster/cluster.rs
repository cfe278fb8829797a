//! Clusters of feature vectors with mean centers and intra-cluster distance

use ndarray::{Array1, ArrayView1};

use crate::io::error::{CrbmError, Result, shape_mismatch};

/// Euclidean distance between two vectors of equal length
pub fn euclidean_distance(a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Common dimensionality of a set of vectors
///
/// # Errors
///
/// Returns `ShapeMismatch` naming the first vector of a different length
pub fn check_dimensions(data: &[Array1<f32>], operation: &'static str) -> Result<usize> {
    let dimension = data.first().map_or(0, Array1::len);
    for (index, vector) in data.iter().enumerate() {
        if vector.len() != dimension {
            return Err(CrbmError::ShapeMismatch {
                operation,
                expected: format!("{dimension} components"),
                actual: vector.len().to_string(),
                sample: Some(index),
            });
        }
    }
    Ok(dimension)
}

/// Group of feature vectors identified by indices into a shared data set
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cluster {
    label: Option<String>,
    center: Option<Array1<f32>>,
    members: Vec<usize>,
    total_distance: f32,
}

impl Cluster {
    /// Cluster over the given members of `data`, with center and distance computed
    pub fn with_members(members: Vec<usize>, data: &[Array1<f32>]) -> Self {
        let mut cluster = Self {
            members,
            ..Self::default()
        };
        cluster.recompute(data);
        cluster
    }

    /// Memberless cluster around a fixed center
    pub fn from_center(center: Array1<f32>) -> Self {
        Self {
            label: None,
            center: Some(center),
            members: Vec::new(),
            total_distance: 0.0,
        }
    }

    /// Attach a label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Replace the label
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Add a member without recomputing
    pub fn add_member(&mut self, index: usize) {
        self.members.push(index);
    }

    /// Recompute center and total distance from the current members
    ///
    /// A cluster without members has no center and zero distance. Member
    /// indices outside `data` are ignored.
    pub fn recompute(&mut self, data: &[Array1<f32>]) {
        let vectors: Vec<&Array1<f32>> = self
            .members
            .iter()
            .filter_map(|&index| data.get(index))
            .collect();

        self.center = vectors.first().map(|first| {
            let mut sum = Array1::<f32>::zeros(first.len());
            for vector in &vectors {
                sum += *vector;
            }
            sum / vectors.len() as f32
        });

        self.total_distance = self.center.as_ref().map_or(0.0, |center| {
            vectors
                .iter()
                .map(|vector| euclidean_distance(&center.view(), &vector.view()))
                .sum()
        });
    }

    /// Label, if any
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Mean of the members, undefined for an empty cluster
    pub const fn center(&self) -> Option<&Array1<f32>> {
        self.center.as_ref()
    }

    /// Center of the cluster at position `index` of its collection
    ///
    /// # Errors
    ///
    /// Returns `DegenerateCluster` if the cluster has no center
    pub fn require_center(&self, index: usize) -> Result<&Array1<f32>> {
        self.center
            .as_ref()
            .ok_or(CrbmError::DegenerateCluster { index })
    }

    /// Indices of the member vectors
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Whether the cluster has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sum of Euclidean distances from members to the center
    pub const fn total_distance(&self) -> f32 {
        self.total_distance
    }

    /// Distance from `vector` to the center
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the lengths differ, or `DegenerateCluster`
    /// (reported as index 0) if the cluster has no center
    pub fn distance_to_center(&self, vector: &ArrayView1<'_, f32>) -> Result<f32> {
        let center = self.require_center(0)?;
        if center.len() != vector.len() {
            return Err(shape_mismatch(
                "distance_to_center",
                &format!("{} components", center.len()),
                &vector.len(),
            ));
        }
        Ok(euclidean_distance(&center.view(), vector))
    }
}

/// Sum of the total distances of all clusters
pub fn total_distance(clusters: &[Cluster]) -> f32 {
    clusters.iter().map(Cluster::total_distance).sum()
}

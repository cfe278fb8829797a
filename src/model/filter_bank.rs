//! Filter bank owned by a single CRBM layer
//!
//! Weights are stored as `(filter, channel, row, col)`. A first-layer bank has a
//! single channel per filter; a depth-aware bank holds one kernel per input channel.

use ndarray::{Array4, ArrayView2, ArrayView3, ArrayView4, Axis, Zip};
use rand::Rng;

use crate::io::error::{Result, invalid_parameter, shape_mismatch};
use crate::math::convolution::flip;

/// Ordered collection of square convolution kernels
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBank {
    weights: Array4<f32>,
}

impl FilterBank {
    /// Create a bank with weights drawn from `scale * U(-1, 1) / F²`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if any dimension is zero
    pub fn random<R: Rng + ?Sized>(
        filter_count: usize,
        channels: usize,
        edge_length: usize,
        scale: f32,
        rng: &mut R,
    ) -> Result<Self> {
        Self::validate_dimensions(filter_count, channels, edge_length)?;
        let fan = (edge_length * edge_length) as f32;
        let weights = Array4::from_shape_fn(
            (filter_count, channels, edge_length, edge_length),
            |_| scale * (rng.random::<f32>() - 0.5) * 2.0 / fan,
        );
        Ok(Self { weights })
    }

    /// Create a bank with every weight set to zero
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if any dimension is zero
    pub fn zeros(filter_count: usize, channels: usize, edge_length: usize) -> Result<Self> {
        Self::validate_dimensions(filter_count, channels, edge_length)?;
        Ok(Self {
            weights: Array4::zeros((filter_count, channels, edge_length, edge_length)),
        })
    }

    /// Wrap existing weights shaped `(filter, channel, row, col)`
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if kernels are not square, `InvalidParameter` if
    /// any dimension is zero
    pub fn from_weights(weights: Array4<f32>) -> Result<Self> {
        let (filter_count, channels, rows, cols) = weights.dim();
        if rows != cols {
            return Err(shape_mismatch(
                "FilterBank::from_weights",
                &"square kernels",
                &format!("{rows}x{cols}"),
            ));
        }
        Self::validate_dimensions(filter_count, channels, rows)?;
        Ok(Self { weights })
    }

    fn validate_dimensions(filter_count: usize, channels: usize, edge_length: usize) -> Result<()> {
        if filter_count == 0 {
            return Err(invalid_parameter(
                "filter_count",
                &filter_count,
                &"must be positive",
            ));
        }
        if channels == 0 {
            return Err(invalid_parameter("channels", &channels, &"must be positive"));
        }
        if edge_length == 0 {
            return Err(invalid_parameter(
                "filter_edge_length",
                &edge_length,
                &"must be positive",
            ));
        }
        Ok(())
    }

    /// Number of filters `K`
    pub fn filter_count(&self) -> usize {
        self.weights.len_of(Axis(0))
    }

    /// Number of kernels per filter
    pub fn channels(&self) -> usize {
        self.weights.len_of(Axis(1))
    }

    /// Kernel side length `F`
    pub fn edge_length(&self) -> usize {
        self.weights.len_of(Axis(2))
    }

    /// All weights as `(filter, channel, row, col)`
    pub fn weights(&self) -> ArrayView4<'_, f32> {
        self.weights.view()
    }

    /// Kernels of one filter, one per input channel
    pub fn filter(&self, index: usize) -> ArrayView3<'_, f32> {
        self.weights.index_axis(Axis(0), index)
    }

    /// Single kernel of one filter
    pub fn kernel(&self, filter: usize, channel: usize) -> ArrayView2<'_, f32> {
        self.weights
            .index_axis(Axis(0), filter)
            .index_axis_move(Axis(0), channel)
    }

    /// Bank with every kernel rotated by 180 degrees
    pub fn flipped(&self) -> Self {
        let mut weights = self.weights.clone();
        for mut filter in weights.outer_iter_mut() {
            for mut kernel in filter.outer_iter_mut() {
                let rotated = flip(&kernel.view());
                kernel.assign(&rotated);
            }
        }
        Self { weights }
    }

    /// Apply a contrastive-divergence step `W += rate * (positive - negative)`
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if either statistic differs in shape from the bank
    pub fn apply(
        &mut self,
        positive: &ArrayView4<'_, f32>,
        negative: &ArrayView4<'_, f32>,
        learning_rate: f32,
    ) -> Result<()> {
        if positive.dim() != self.weights.dim() || negative.dim() != self.weights.dim() {
            return Err(shape_mismatch(
                "FilterBank::apply",
                &format!("{:?}", self.weights.dim()),
                &format!("{:?} / {:?}", positive.dim(), negative.dim()),
            ));
        }

        Zip::from(&mut self.weights)
            .and(positive)
            .and(negative)
            .for_each(|weight, &pos, &neg| *weight += learning_rate * (pos - neg));
        Ok(())
    }

    /// Flatten the bank into a float array in `(filter, channel, row, col)` order
    pub fn to_vec(&self) -> Vec<f32> {
        self.weights.iter().copied().collect()
    }
}

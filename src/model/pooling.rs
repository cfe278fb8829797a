//! Max pooling of hidden-map stacks with optional cross-channel suppression
//!
//! Maps whose side is not a multiple of the pooling size are first resampled by
//! nearest neighbour up to the next multiple, so the pooled side is
//! `ceil(edge / pooling_size)`.

use ndarray::{Array3, ArrayView3, s};

use crate::io::error::{Result, invalid_parameter, shape_mismatch};
use crate::math::resize::nearest_neighbour_stack;

/// How pooled channels interact at each spatial location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolingPolicy {
    /// Every channel keeps its own block maximum
    #[default]
    PerChannel,
    /// Only the channel with the highest block maximum keeps it; ties go to
    /// the first channel
    WinnerTakeAll,
}

/// Side length after pooling a map of side `edge_length`
pub const fn pooled_edge_length(edge_length: usize, pooling_size: usize) -> usize {
    edge_length.div_ceil(pooling_size)
}

/// Non-overlapping max pooling over square blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pooler {
    pooling_size: usize,
    policy: PoolingPolicy,
}

impl Pooler {
    /// Create a pooler for `pooling_size × pooling_size` blocks
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `pooling_size` is zero
    pub fn new(pooling_size: usize, policy: PoolingPolicy) -> Result<Self> {
        if pooling_size == 0 {
            return Err(invalid_parameter(
                "pooling_size",
                &pooling_size,
                &"must be positive",
            ));
        }
        Ok(Self {
            pooling_size,
            policy,
        })
    }

    /// Block side length
    pub const fn pooling_size(&self) -> usize {
        self.pooling_size
    }

    /// Cross-channel policy
    pub const fn policy(&self) -> PoolingPolicy {
        self.policy
    }

    /// Pool the hidden maps of a layer with visible side `data_edge_length`
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the filter is larger than the data or the
    /// maps are not of side `data_edge_length - (filter_edge_length - 1)`
    pub fn max_pool_layer(
        &self,
        channels: &ArrayView3<'_, f32>,
        data_edge_length: usize,
        filter_edge_length: usize,
    ) -> Result<Array3<f32>> {
        let (_, rows, cols) = channels.dim();
        let Some(expected) = data_edge_length.saturating_add(1).checked_sub(filter_edge_length) else {
            return Err(shape_mismatch(
                "max_pool",
                &format!("filter edge at most {data_edge_length}"),
                &filter_edge_length,
            ));
        };
        if rows != expected || cols != expected {
            return Err(shape_mismatch(
                "max_pool",
                &format!("{expected}x{expected} maps"),
                &format!("{rows}x{cols}"),
            ));
        }
        self.max_pool(channels)
    }

    /// Pool a stack of square maps
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the maps are not square and non-empty
    pub fn max_pool(&self, channels: &ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        let (count, rows, cols) = channels.dim();
        if rows != cols || rows == 0 {
            return Err(shape_mismatch(
                "max_pool",
                &"non-empty square maps",
                &format!("{rows}x{cols}"),
            ));
        }

        let size = self.pooling_size;
        let pooled_edge = pooled_edge_length(rows, size);

        let resized;
        let working = if rows % size == 0 {
            channels.view()
        } else {
            resized = nearest_neighbour_stack(channels, pooled_edge * size);
            resized.view()
        };

        let mut result = Array3::zeros((count, pooled_edge, pooled_edge));
        for (mut target, channel) in result.outer_iter_mut().zip(working.outer_iter()) {
            for ((y, x), cell) in target.indexed_iter_mut() {
                let block = channel.slice(s![y * size..(y + 1) * size, x * size..(x + 1) * size]);
                *cell = block.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            }
        }

        if self.policy == PoolingPolicy::WinnerTakeAll {
            suppress_losers(&mut result);
        }

        Ok(result)
    }
}

// Keep only the strongest channel at each location
fn suppress_losers(stack: &mut Array3<f32>) {
    let (_, rows, cols) = stack.dim();
    for y in 0..rows {
        for x in 0..cols {
            let mut column = stack.slice_mut(s![.., y, x]);
            let mut winner = 0;
            let mut best = f32::NEG_INFINITY;
            for (k, &value) in column.iter().enumerate() {
                if value > best {
                    best = value;
                    winner = k;
                }
            }
            for (k, value) in column.iter_mut().enumerate() {
                if k != winner {
                    *value = 0.0;
                }
            }
        }
    }
}

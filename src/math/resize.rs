//! Nearest-neighbour resampling of square maps

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

/// Resample a square map to a new side length
///
/// Destination cell `(y, x)` reads source cell
/// `(floor(y * src / dst), floor(x * src / dst))`.
pub fn nearest_neighbour(map: &ArrayView2<'_, f32>, new_edge_length: usize) -> Array2<f32> {
    let (rows, cols) = map.dim();
    if new_edge_length == 0 || rows == 0 || cols == 0 {
        return Array2::zeros((new_edge_length, new_edge_length));
    }

    let y_ratio = rows as f32 / new_edge_length as f32;
    let x_ratio = cols as f32 / new_edge_length as f32;

    Array2::from_shape_fn((new_edge_length, new_edge_length), |(y, x)| {
        let source_y = ((y as f32 * y_ratio) as usize).min(rows - 1);
        let source_x = ((x as f32 * x_ratio) as usize).min(cols - 1);
        map.get((source_y, source_x)).copied().unwrap_or(0.0)
    })
}

/// Resample every channel of a stack
pub fn nearest_neighbour_stack(stack: &ArrayView3<'_, f32>, new_edge_length: usize) -> Array3<f32> {
    let channels = stack.len_of(Axis(0));
    let mut result = Array3::zeros((channels, new_edge_length, new_edge_length));
    for (mut target, channel) in result.outer_iter_mut().zip(stack.outer_iter()) {
        target.assign(&nearest_neighbour(&channel, new_edge_length));
    }
    result
}

//! Conversions between flat pixel arrays, square grids, channel stacks and
//! row matrices of feature vectors

use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::io::error::{CrbmError, Result, empty_data_set, shape_mismatch};

/// Build a square grid from a flat row-major pixel array
///
/// # Errors
///
/// Returns `ShapeMismatch` if the length is not a non-zero perfect square
pub fn square_from_flat(pixels: Vec<f32>) -> Result<Array2<f32>> {
    let len = pixels.len();
    let edge = len.isqrt();
    if edge == 0 || edge * edge != len {
        return Err(shape_mismatch(
            "square_from_flat",
            &"perfect square length",
            &len,
        ));
    }
    Array2::from_shape_vec((edge, edge), pixels)
        .map_err(|e| shape_mismatch("square_from_flat", &format!("{edge}x{edge}"), &e))
}

/// View a single grid as a one-channel stack
pub fn single_channel(grid: Array2<f32>) -> Array3<f32> {
    grid.insert_axis(Axis(0))
}

/// Concatenate channel maps in channel-major, row-major order
pub fn flatten(stack: &ArrayView3<'_, f32>) -> Array1<f32> {
    stack.iter().copied().collect()
}

/// Stack equally long vectors as the rows of a matrix
///
/// # Errors
///
/// Returns `EmptyDataSet` for no vectors, or `ShapeMismatch` naming the first
/// vector whose length differs from the first one
pub fn stack_rows(vectors: &[Array1<f32>]) -> Result<Array2<f32>> {
    let Some(first) = vectors.first() else {
        return Err(empty_data_set("stack_rows"));
    };
    if let Some((index, vector)) = vectors
        .iter()
        .enumerate()
        .find(|(_, vector)| vector.len() != first.len())
    {
        return Err(CrbmError::ShapeMismatch {
            operation: "stack_rows",
            expected: format!("{} values", first.len()),
            actual: vector.len().to_string(),
            sample: Some(index),
        });
    }

    let views: Vec<_> = vectors.iter().map(Array1::view).collect();
    ndarray::stack(Axis(0), &views)
        .map_err(|e| shape_mismatch("stack_rows", &"vectors of equal length", &e))
}

/// Rows of a matrix as owned vectors
pub fn split_rows(matrix: &ArrayView2<'_, f32>) -> Vec<Array1<f32>> {
    matrix.outer_iter().map(|row| row.to_owned()).collect()
}

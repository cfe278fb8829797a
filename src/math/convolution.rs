//! Valid cross-correlation of square grids with square kernels
//!
//! Kernels are applied unflipped and without padding, so every output side
//! shrinks by `kernel_edge - 1`. Depth-aware variants correlate a stack of
//! channels with a matching stack of kernels.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, Zip, s};

use crate::io::error::{Result, shape_mismatch};

/// Side length of a valid correlation output
///
/// Zero when the kernel is larger than the data.
pub const fn output_edge_length(data_edge_length: usize, kernel_edge_length: usize) -> usize {
    data_edge_length
        .saturating_add(1)
        .saturating_sub(kernel_edge_length)
}

fn square_edge(view: &ArrayView2<'_, f32>, operation: &'static str) -> Result<usize> {
    let (rows, cols) = view.dim();
    if rows != cols || rows == 0 {
        return Err(shape_mismatch(
            operation,
            &"non-empty square grid",
            &format!("{rows}x{cols}"),
        ));
    }
    Ok(rows)
}

/// Correlate a square grid with a square kernel
///
/// Each output cell is the sum of element-wise products of the kernel with the
/// co-located window of `data`.
///
/// # Errors
///
/// Returns `ShapeMismatch` if either input is not square or the kernel is
/// larger than the data
pub fn convolve(data: &ArrayView2<'_, f32>, kernel: &ArrayView2<'_, f32>) -> Result<Array2<f32>> {
    let data_edge = square_edge(data, "convolve")?;
    let kernel_edge = square_edge(kernel, "convolve")?;
    if kernel_edge > data_edge {
        return Err(shape_mismatch(
            "convolve",
            &format!("kernel edge <= {data_edge}"),
            &kernel_edge,
        ));
    }

    let edge = output_edge_length(data_edge, kernel_edge);
    let mut result = Array2::zeros((edge, edge));
    Zip::from(&mut result)
        .and(data.windows((kernel_edge, kernel_edge)))
        .for_each(|cell, window| {
            *cell = window
                .iter()
                .zip(kernel.iter())
                .map(|(value, weight)| value * weight)
                .sum();
        });
    Ok(result)
}

fn check_depth(
    data: &ArrayView3<'_, f32>,
    kernels: &ArrayView3<'_, f32>,
    operation: &'static str,
) -> Result<()> {
    let data_channels = data.len_of(Axis(0));
    let kernel_channels = kernels.len_of(Axis(0));
    if data_channels != kernel_channels || data_channels == 0 {
        return Err(shape_mismatch(
            operation,
            &format!("{data_channels} kernel channels"),
            &kernel_channels,
        ));
    }
    Ok(())
}

/// Correlate every channel with its kernel and sum the results
///
/// Used for the pre-activation that several input channels jointly explain.
///
/// # Errors
///
/// Returns `ShapeMismatch` if the channel counts differ or any channel fails
/// the checks of [`convolve`]
pub fn convolve_summed(
    data: &ArrayView3<'_, f32>,
    kernels: &ArrayView3<'_, f32>,
) -> Result<Array2<f32>> {
    check_depth(data, kernels, "convolve_summed")?;

    let mut total: Option<Array2<f32>> = None;
    for (channel, kernel) in data.outer_iter().zip(kernels.outer_iter()) {
        let response = convolve(&channel, &kernel)?;
        total = Some(match total {
            Some(sum) => sum + response,
            None => response,
        });
    }
    total.ok_or_else(|| shape_mismatch("convolve_summed", &"at least one channel", &0))
}

/// Correlate every channel with its kernel, keeping one map per channel
///
/// # Errors
///
/// Returns `ShapeMismatch` if the channel counts differ or any channel fails
/// the checks of [`convolve`]
pub fn convolve_per_channel(
    data: &ArrayView3<'_, f32>,
    kernels: &ArrayView3<'_, f32>,
) -> Result<Array3<f32>> {
    check_depth(data, kernels, "convolve_per_channel")?;

    let channels = data.len_of(Axis(0));
    let mut result: Option<Array3<f32>> = None;
    for (index, (channel, kernel)) in data.outer_iter().zip(kernels.outer_iter()).enumerate() {
        let response = convolve(&channel, &kernel)?;
        let stack = result.get_or_insert_with(|| {
            let (rows, cols) = response.dim();
            Array3::zeros((channels, rows, cols))
        });
        stack.index_axis_mut(Axis(0), index).assign(&response);
    }
    result.ok_or_else(|| shape_mismatch("convolve_per_channel", &"at least one channel", &0))
}

/// Rotate a kernel by 180 degrees
///
/// Equivalent to reversing the row-major flattened kernel.
pub fn flip(kernel: &ArrayView2<'_, f32>) -> Array2<f32> {
    kernel.slice(s![..;-1, ..;-1]).to_owned()
}

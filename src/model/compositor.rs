//! Border-preserving assembly of visible reconstructions
//!
//! A forward correlation followed by a flipped backward correlation shrinks a
//! side-`D` grid to `D - 2 * (F - 1)`. The compositor grows it back: cells within
//! `F - 1` of an edge come from the original input, the interior from the
//! deconvolved grid. Without an original, border cells repeat the nearest
//! deconvolved edge value.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::io::error::{Result, shape_mismatch};

/// Edge length of the deconvolved interior for a given visible edge
pub const fn interior_edge_length(data_edge_length: usize, filter_edge_length: usize) -> usize {
    data_edge_length.saturating_sub(2 * filter_edge_length.saturating_sub(1))
}

/// Merge a deconvolved interior into a full-size visible grid
///
/// # Errors
///
/// Returns `ShapeMismatch` if the interior is not square, or if `original` is
/// present and its side differs from `interior + 2 * (F - 1)`
pub fn composite(
    original: Option<&ArrayView2<'_, f32>>,
    interior: &ArrayView2<'_, f32>,
    filter_edge_length: usize,
) -> Result<Array2<f32>> {
    let (rows, cols) = interior.dim();
    if rows != cols {
        return Err(shape_mismatch(
            "composite",
            &"square interior",
            &format!("{rows}x{cols}"),
        ));
    }

    let offset = filter_edge_length.saturating_sub(1);
    let edge = rows + 2 * offset;

    if let Some(source) = original {
        if source.dim() != (edge, edge) {
            let (source_rows, source_cols) = source.dim();
            return Err(shape_mismatch(
                "composite",
                &format!("{edge}x{edge} original"),
                &format!("{source_rows}x{source_cols}"),
            ));
        }
    }

    let is_border = |y: usize, x: usize| {
        y < offset || x < offset || y >= edge - offset || x >= edge - offset
    };

    Ok(Array2::from_shape_fn((edge, edge), |(y, x)| {
        if is_border(y, x) {
            match original {
                Some(source) => source.get((y, x)).copied().unwrap_or(0.0),
                None if rows == 0 => 0.0,
                None => {
                    let inner_y = y.saturating_sub(offset).min(rows - 1);
                    let inner_x = x.saturating_sub(offset).min(cols - 1);
                    interior.get((inner_y, inner_x)).copied().unwrap_or(0.0)
                }
            }
        } else {
            interior
                .get((y - offset, x - offset))
                .copied()
                .unwrap_or(0.0)
        }
    }))
}

/// Composite every channel of a stack against the matching original channel
///
/// # Errors
///
/// Returns `ShapeMismatch` if channel counts differ or any channel fails the
/// checks of [`composite`]
pub fn composite_stack(
    original: Option<&ArrayView3<'_, f32>>,
    interior: &ArrayView3<'_, f32>,
    filter_edge_length: usize,
) -> Result<Array3<f32>> {
    let channels = interior.len_of(Axis(0));
    if let Some(source) = original {
        if source.len_of(Axis(0)) != channels {
            return Err(shape_mismatch(
                "composite_stack",
                &format!("{channels} original channels"),
                &source.len_of(Axis(0)),
            ));
        }
    }

    let (_, rows, _) = interior.dim();
    let edge = rows + 2 * filter_edge_length.saturating_sub(1);
    let mut result = Array3::zeros((channels, edge, edge));

    for (index, (mut target, channel)) in result
        .outer_iter_mut()
        .zip(interior.outer_iter())
        .enumerate()
    {
        let source = original.map(|stack| stack.index_axis(Axis(0), index));
        target.assign(&composite(source.as_ref(), &channel, filter_edge_length)?);
    }

    Ok(result)
}

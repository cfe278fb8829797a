//! Tests for flat, grid and stack conversions

#[cfg(test)]
mod tests {
    use crbm::CrbmError;
    use crbm::model::sample::{flatten, single_channel, split_rows, square_from_flat, stack_rows};
    use ndarray::{Array3, array};

    // Tests flat pixels are laid out row-major
    // Verified by building the grid column-major
    #[test]
    fn test_square_from_flat_row_major() {
        let grid = square_from_flat(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(grid, array![[1.0, 2.0], [3.0, 4.0]]);
    }

    // Tests lengths that are not perfect squares are rejected
    // Verified by truncating to the nearest square
    #[test]
    fn test_square_from_flat_rejects() {
        assert!(square_from_flat(vec![0.0; 8]).is_err());
    }

    // Tests a grid becomes a one-channel stack
    // Verified by inserting the axis last
    #[test]
    fn test_single_channel() {
        let stack = single_channel(array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(stack.dim(), (1, 2, 2));
    }

    // Tests flattening is channel-major
    // Verified by iterating in column order
    #[test]
    fn test_flatten_channel_major() {
        let stack = Array3::from_shape_fn((2, 2, 2), |(c, y, x)| (c * 4 + y * 2 + x) as f32);
        let flat = flatten(&stack.view());
        assert_eq!(flat.to_vec(), (0..8).map(|v| v as f32).collect::<Vec<_>>());
    }

    // Tests vectors become matrix rows and back
    // Verified by stacking along columns
    #[test]
    fn test_stack_and_split_rows() {
        let vectors = vec![array![1.0, 2.0, 3.0], array![4.0, 5.0, 6.0]];
        let matrix = stack_rows(&vectors).unwrap();
        assert_eq!(matrix, array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(split_rows(&matrix.view()), vectors);
    }

    // Tests a ragged set names the first offending vector
    // Verified by reporting the last vector
    #[test]
    fn test_stack_rows_ragged() {
        let vectors = vec![array![1.0, 2.0], array![1.0, 2.0], array![1.0], array![2.0]];
        assert!(matches!(
            stack_rows(&vectors),
            Err(CrbmError::ShapeMismatch {
                sample: Some(2),
                ..
            })
        ));
        assert!(matches!(stack_rows(&[]), Err(CrbmError::EmptyDataSet { .. })));
    }
}

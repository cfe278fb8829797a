//! Tests for nearest-neighbour resampling

#[cfg(test)]
mod tests {
    use crbm::math::resize::{nearest_neighbour, nearest_neighbour_stack};
    use ndarray::{Array3, array};

    // Tests downsampling picks floor(dst * ratio)
    // Verified by rounding instead of flooring
    #[test]
    fn test_downsample() {
        let map = array![
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0]
        ];
        let result = nearest_neighbour(&map.view(), 2);
        assert_eq!(result, array![[1.0, 3.0], [9.0, 11.0]]);
    }

    // Tests upsampling repeats source cells
    // Verified by interpolating between cells
    #[test]
    fn test_upsample() {
        let map = array![[1.0, 2.0], [3.0, 4.0]];
        let result = nearest_neighbour(&map.view(), 4);
        assert_eq!(result.row(0).to_vec(), vec![1.0, 1.0, 2.0, 2.0]);
        assert_eq!(result.row(3).to_vec(), vec![3.0, 3.0, 4.0, 4.0]);
    }

    // Tests a 3 to 4 resize keeps corner values
    // Verified by removing the clamp on the source index
    #[test]
    fn test_uneven_resize_keeps_corners() {
        let map = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let result = nearest_neighbour(&map.view(), 4);
        assert_eq!(result[[0, 0]], 1.0);
        assert_eq!(result[[3, 3]], 9.0);
    }

    // Tests stacks are resized channel by channel
    // Verified by resizing only the first channel
    #[test]
    fn test_stack_resize() {
        let stack = Array3::from_shape_fn((2, 2, 2), |(c, _, _)| c as f32);
        let result = nearest_neighbour_stack(&stack.view(), 3);
        assert_eq!(result.dim(), (2, 3, 3));
        assert!(result.index_axis(ndarray::Axis(0), 1).iter().all(|&v| v == 1.0));
    }
}

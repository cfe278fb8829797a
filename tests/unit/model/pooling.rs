//! Tests for max pooling and winner-take-all suppression

#[cfg(test)]
mod tests {
    use crbm::CrbmError;
    use crbm::math::resize::nearest_neighbour_stack;
    use crbm::model::pooling::{Pooler, PoolingPolicy, pooled_edge_length};
    use ndarray::{Array3, array};

    fn ramp_stack(channels: usize, edge: usize) -> Array3<f32> {
        Array3::from_shape_fn((channels, edge, edge), |(c, y, x)| {
            (c * 100 + y * edge + x) as f32
        })
    }

    // Tests each block keeps its maximum
    // Verified by taking the block's first cell
    #[test]
    fn test_per_channel_max() {
        let pooler = Pooler::new(2, PoolingPolicy::PerChannel).unwrap();
        let stack = ramp_stack(1, 4);
        let pooled = pooler.max_pool(&stack.view()).unwrap();
        assert_eq!(pooled.dim(), (1, 2, 2));
        assert_eq!(pooled[[0, 0, 0]], 5.0);
        assert_eq!(pooled[[0, 0, 1]], 7.0);
        assert_eq!(pooled[[0, 1, 0]], 13.0);
        assert_eq!(pooled[[0, 1, 1]], 15.0);
    }

    // Tests negative blocks keep their true maximum
    // Verified by starting the fold at zero
    #[test]
    fn test_negative_values() {
        let pooler = Pooler::new(2, PoolingPolicy::PerChannel).unwrap();
        let stack = Array3::from_elem((1, 2, 2), -0.25);
        let pooled = pooler.max_pool(&stack.view()).unwrap();
        assert_eq!(pooled[[0, 0, 0]], -0.25);
    }

    // Tests resizing an evenly divisible grid changes nothing
    // Verified by always resizing to edge + size
    #[test]
    fn test_resize_is_noop_when_divisible() {
        let pooler = Pooler::new(2, PoolingPolicy::PerChannel).unwrap();
        let stack = ramp_stack(3, 6);
        let resized = nearest_neighbour_stack(&stack.view(), 6);
        assert_eq!(
            pooler.max_pool(&stack.view()).unwrap(),
            pooler.max_pool(&resized.view()).unwrap()
        );
    }

    // Tests uneven grids pool to ceil(edge / size)
    // Verified by truncating the pooled side
    #[test]
    fn test_uneven_grid() {
        let pooler = Pooler::new(2, PoolingPolicy::PerChannel).unwrap();
        let stack = ramp_stack(2, 5);
        let pooled = pooler.max_pool(&stack.view()).unwrap();
        assert_eq!(pooled.dim(), (2, 3, 3));
        assert_eq!(pooled[[0, 2, 2]], 24.0);
        assert_eq!(pooled_edge_length(5, 2), 3);
    }

    // Tests only the strongest channel survives at each location
    // Verified by keeping the last channel on ties
    #[test]
    fn test_winner_take_all() {
        let pooler = Pooler::new(1, PoolingPolicy::WinnerTakeAll).unwrap();
        let stack = array![[[0.9, 0.1], [0.3, 0.5]], [[0.2, 0.8], [0.3, 0.4]]];
        let pooled = pooler.max_pool(&stack.view()).unwrap();
        assert_eq!(pooled, array![[[0.9, 0.0], [0.3, 0.5]], [[0.0, 0.8], [0.0, 0.0]]]);
    }

    // Tests per-channel pooling leaves every channel intact
    // Verified by suppressing under the default policy
    #[test]
    fn test_default_policy_keeps_channels() {
        let pooler = Pooler::new(1, PoolingPolicy::default()).unwrap();
        let stack = array![[[0.9]], [[0.2]]];
        assert_eq!(pooler.max_pool(&stack.view()).unwrap(), stack);
        assert_eq!(pooler.policy(), PoolingPolicy::PerChannel);
    }

    // Tests layer pooling checks the hidden side
    // Verified by skipping the side check
    #[test]
    fn test_max_pool_layer_checks_side() {
        let pooler = Pooler::new(2, PoolingPolicy::PerChannel).unwrap();
        let stack = ramp_stack(1, 4);
        assert!(pooler.max_pool_layer(&stack.view(), 8, 5).is_ok());
        assert!(pooler.max_pool_layer(&stack.view(), 9, 5).is_err());
    }

    // Tests a filter larger than the data is a shape error
    // Verified by subtracting the filter edge unchecked
    #[test]
    fn test_max_pool_layer_oversized_filter() {
        let pooler = Pooler::new(2, PoolingPolicy::PerChannel).unwrap();
        let stack = Array3::<f32>::zeros((1, 2, 2));
        let result = pooler.max_pool_layer(&stack.view(), 2, 5);
        assert!(matches!(result, Err(CrbmError::ShapeMismatch { .. })));
    }

    // Tests a zero pooling size is rejected
    // Verified by allowing a zero size
    #[test]
    fn test_zero_pooling_size() {
        assert!(Pooler::new(0, PoolingPolicy::PerChannel).is_err());
    }
}

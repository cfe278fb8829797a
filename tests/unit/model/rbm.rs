//! Tests for the dense RBM stage

#[cfg(test)]
mod tests {
    use crbm::CrbmError;
    use crbm::io::configuration::DENSE_WEIGHT_SCALE;
    use crbm::model::rbm::Rbm;
    use crbm::model::stopping::StoppingCondition;
    use ndarray::{Array2, array};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // Tests random weights are small, positive and visible-major
    // Verified by drawing from U(-1, 1)
    #[test]
    fn test_new_weights() {
        let rbm = Rbm::new(6, 3, &mut StdRng::seed_from_u64(41)).unwrap();
        assert_eq!(rbm.weights().dim(), (6, 3));
        assert_eq!((rbm.visible_count(), rbm.hidden_count()), (6, 3));
        assert!(rbm.weights().iter().all(|&w| (0.0..DENSE_WEIGHT_SCALE).contains(&w)));
        assert!(rbm.last_error().is_infinite());
    }

    // Tests zero unit counts are rejected
    // Verified by allowing an empty weight matrix
    #[test]
    fn test_zero_units() {
        let mut rng = StdRng::seed_from_u64(42);
        assert!(matches!(Rbm::new(0, 3, &mut rng), Err(CrbmError::InvalidParameter { .. })));
        assert!(matches!(Rbm::new(3, 0, &mut rng), Err(CrbmError::InvalidParameter { .. })));
    }

    // Tests both directions pass through the logistic function
    // Verified by returning raw products
    #[test]
    fn test_hidden_and_visible() {
        let rbm = Rbm::with_weights(array![[1.0, 0.0], [0.0, -1.0], [0.0, 0.0]]).unwrap();
        let hidden = rbm.get_hidden(&array![[1.0, 1.0, 1.0]].view()).unwrap();
        assert!((hidden[[0, 0]] - 1.0 / (1.0 + (-1.0f32).exp())).abs() < 1e-6);
        assert!((hidden[[0, 1]] - 1.0 / (1.0 + 1.0f32.exp())).abs() < 1e-6);

        let visible = rbm.get_visible(&array![[0.0, 0.0]].view()).unwrap();
        assert_eq!(visible.dim(), (1, 3));
        assert!(visible.iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    // Tests rows of the wrong width are rejected
    // Verified by letting the matrix product panic
    #[test]
    fn test_wrong_width() {
        let rbm = Rbm::with_weights(Array2::zeros((3, 2))).unwrap();
        assert!(matches!(
            rbm.get_hidden(&Array2::zeros((1, 2)).view()),
            Err(CrbmError::ShapeMismatch { .. })
        ));
        assert!(rbm.get_visible(&Array2::zeros((1, 3)).view()).is_err());
    }

    // Tests one CD-1 step from zero weights
    // Verified by dropping the division by the row count
    #[test]
    fn test_single_epoch_update() {
        let mut rbm = Rbm::with_weights(Array2::zeros((2, 1))).unwrap();
        let data = array![[1.0, 0.0]];
        let error = rbm.train_epoch(&data.view(), 0.4).unwrap();

        // Positive statistic [0.5, 0], negative [0.25, 0.25]
        assert!((rbm.weights()[[0, 0]] - 0.1).abs() < 1e-6);
        assert!((rbm.weights()[[1, 0]] + 0.1).abs() < 1e-6);
        assert!((error - 0.125f32.sqrt()).abs() < 1e-6);
        assert!((rbm.last_error() - error).abs() < f32::EPSILON);
    }

    // Tests a zero learning rate leaves the weights unchanged
    // Verified by applying the gradient unscaled
    #[test]
    fn test_zero_learning_rate() {
        let mut rbm = Rbm::new(4, 2, &mut StdRng::seed_from_u64(43)).unwrap();
        let before = rbm.weights().to_owned();
        rbm.train_epoch(&array![[1.0, 0.0, 1.0, 0.0]].view(), 0.0).unwrap();
        assert_eq!(rbm.weights(), before.view());
    }

    // Tests training on a repeated pattern lowers the error
    // Verified by subtracting the positive statistic
    #[test]
    fn test_training_lowers_error() {
        let mut rbm = Rbm::new(4, 2, &mut StdRng::seed_from_u64(44)).unwrap();
        let data = array![[1.0, 0.0, 1.0, 0.0], [1.0, 0.0, 1.0, 0.0]];
        let mut errors = Vec::new();
        let mut stop = StoppingCondition::new(20);

        rbm.train_until(&data.view(), &mut stop, 1.0, |report| errors.push(report.error))
            .unwrap();

        assert_eq!(errors.len(), 20);
        assert!(errors[19] < errors[0]);
    }

    // Tests the convergence threshold ends training early
    // Verified by ignoring the stopping condition
    #[test]
    fn test_train_until_converges() {
        let mut rbm = Rbm::with_weights(Array2::zeros((2, 1))).unwrap();
        let mut stop = StoppingCondition::new(50).with_convergence_error(1.0);
        let mut epochs = 0;
        rbm.train_until(&array![[1.0, 0.0]].view(), &mut stop, 0.1, |_| epochs += 1)
            .unwrap();
        assert_eq!(epochs, 1);
    }

    // Tests training without rows fails at entry
    // Verified by dividing by the zero row count
    #[test]
    fn test_empty_data() {
        let mut rbm = Rbm::with_weights(Array2::zeros((2, 1))).unwrap();
        assert!(matches!(
            rbm.train(&Array2::zeros((0, 2)).view(), 3, 0.1),
            Err(CrbmError::EmptyDataSet { .. })
        ));
    }
}

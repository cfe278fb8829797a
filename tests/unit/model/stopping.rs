//! Tests for epoch budgets and convergence thresholds

#[cfg(test)]
mod tests {
    use crbm::model::stopping::StoppingCondition;

    // Tests the budget alone ends training
    // Verified by using <= in the epoch comparison
    #[test]
    fn test_epoch_budget() {
        let mut stop = StoppingCondition::new(2);
        assert!(stop.is_not_done());
        stop.update(1.0);
        assert!(stop.is_not_done());
        stop.update(1.0);
        assert!(!stop.is_not_done());
        assert_eq!(stop.current_epoch(), 2);
    }

    // Tests reaching the convergence error ends training early
    // Verified by ignoring the threshold
    #[test]
    fn test_convergence_error() {
        let mut stop = StoppingCondition::new(100).with_convergence_error(0.5);
        stop.update(0.8);
        assert!(stop.is_not_done());
        stop.update(0.5);
        assert!(!stop.is_not_done());
        assert!((stop.error() - 0.5).abs() < f32::EPSILON);
    }

    // Tests a zero budget never trains
    // Verified by starting at epoch one
    #[test]
    fn test_zero_budget() {
        assert!(!StoppingCondition::new(0).is_not_done());
    }
}

//! Epoch budget and convergence tracking for training loops

/// Tracks the epoch counter and the most recent error of a training run
///
/// Training continues while epochs remain and the error has not dropped to the
/// convergence threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct StoppingCondition {
    max_epochs: usize,
    current_epoch: usize,
    error: f32,
    convergence_error: Option<f32>,
}

impl StoppingCondition {
    /// Stop after a fixed number of epochs
    pub const fn new(max_epochs: usize) -> Self {
        Self {
            max_epochs,
            current_epoch: 0,
            error: f32::INFINITY,
            convergence_error: None,
        }
    }

    /// Additionally stop once the error is at or below `threshold`
    #[must_use]
    pub const fn with_convergence_error(mut self, threshold: f32) -> Self {
        self.convergence_error = Some(threshold);
        self
    }

    /// Whether another epoch should run
    pub fn is_not_done(&self) -> bool {
        self.current_epoch < self.max_epochs
            && self
                .convergence_error
                .is_none_or(|threshold| self.error > threshold)
    }

    /// Record a finished epoch and its error
    pub const fn update(&mut self, error: f32) {
        self.current_epoch += 1;
        self.error = error;
    }

    /// Epochs completed so far
    pub const fn current_epoch(&self) -> usize {
        self.current_epoch
    }

    /// Epoch budget
    pub const fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    /// Error reported by the most recent epoch
    pub const fn error(&self) -> f32 {
        self.error
    }
}

//! Dense restricted Boltzmann machine over flattened feature vectors
//!
//! Visible and hidden units are fully connected by a `visible × hidden` weight
//! matrix without biases. Training runs CD-1 on the whole batch at once, using
//! probabilities in both phases.

use ndarray::{Array2, ArrayView2};
use rand::Rng;
use tracing::debug;

use crate::io::configuration::DENSE_WEIGHT_SCALE;
use crate::io::error::{Result, empty_data_set, invalid_parameter, shape_mismatch};
use crate::math::stochastic::logistic;
use crate::model::crbm::EpochReport;
use crate::model::stopping::StoppingCondition;

/// Fully connected RBM reducing feature vectors to hidden probabilities
#[derive(Debug, Clone)]
pub struct Rbm {
    weights: Array2<f32>,
    last_error: f32,
}

impl Rbm {
    /// Create a machine with small positive random weights
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if either unit count is zero
    pub fn new<R: Rng + ?Sized>(
        visible_count: usize,
        hidden_count: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let weights = Array2::from_shape_simple_fn((visible_count, hidden_count), || {
            DENSE_WEIGHT_SCALE * rng.random::<f32>()
        });
        Self::with_weights(weights)
    }

    /// Create a machine around an existing `visible × hidden` weight matrix
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if either dimension is zero
    pub fn with_weights(weights: Array2<f32>) -> Result<Self> {
        let (visible, hidden) = weights.dim();
        if visible == 0 {
            return Err(invalid_parameter("visible_count", &visible, &"must be positive"));
        }
        if hidden == 0 {
            return Err(invalid_parameter("hidden_count", &hidden, &"must be positive"));
        }
        Ok(Self {
            weights,
            last_error: f32::INFINITY,
        })
    }

    /// Current weights, one row per visible unit
    pub fn weights(&self) -> ArrayView2<'_, f32> {
        self.weights.view()
    }

    /// Number of visible units
    pub fn visible_count(&self) -> usize {
        self.weights.nrows()
    }

    /// Number of hidden units
    pub fn hidden_count(&self) -> usize {
        self.weights.ncols()
    }

    /// Error of the most recent training epoch
    pub const fn last_error(&self) -> f32 {
        self.last_error
    }

    fn check_columns(
        data: &ArrayView2<'_, f32>,
        expected: usize,
        operation: &'static str,
    ) -> Result<()> {
        if data.ncols() != expected {
            return Err(shape_mismatch(
                operation,
                &format!("{expected} columns"),
                &data.ncols(),
            ));
        }
        Ok(())
    }

    /// Hidden probabilities `logistic(V · W)`, one row per input row
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the rows are not `visible_count` long
    pub fn get_hidden(&self, data: &ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        Self::check_columns(data, self.visible_count(), "Rbm::get_hidden")?;
        Ok(logistic(&data.dot(&self.weights)))
    }

    /// Visible probabilities `logistic(H · Wᵀ)`, one row per hidden row
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the rows are not `hidden_count` long
    pub fn get_visible(&self, hidden: &ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        Self::check_columns(hidden, self.hidden_count(), "Rbm::get_visible")?;
        Ok(logistic(&hidden.dot(&self.weights.t())))
    }

    /// One full-batch CD-1 update
    ///
    /// The weights move by `lr · (V₀ᵀH₀ - V₁ᵀH₁) / rows`. Returns the error
    /// `sqrt(Σ(V₀ - V₁)² / cells / visible_count)`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDataSet` for no rows, or `ShapeMismatch` if the rows are
    /// not `visible_count` long
    pub fn train_epoch(&mut self, data: &ArrayView2<'_, f32>, learning_rate: f32) -> Result<f32> {
        if data.nrows() == 0 {
            return Err(empty_data_set("Rbm::train_epoch"));
        }

        let hidden = self.get_hidden(data)?;
        let positive = data.t().dot(&hidden);
        let reconstruction = self.get_visible(&hidden.view())?;
        let negative_hidden = self.get_hidden(&reconstruction.view())?;
        let negative = reconstruction.t().dot(&negative_hidden);

        let rows = data.nrows() as f32;
        self.weights
            .scaled_add(learning_rate / rows, &(positive - negative));

        let squared: f32 = data
            .iter()
            .zip(reconstruction.iter())
            .map(|(v0, v1)| (v0 - v1) * (v0 - v1))
            .sum();
        self.last_error = (squared / data.len() as f32 / self.visible_count() as f32).sqrt();
        Ok(self.last_error)
    }

    /// Train for a fixed number of epochs
    ///
    /// # Errors
    ///
    /// Returns `EmptyDataSet` for no rows, or `ShapeMismatch` for rows of the
    /// wrong length
    pub fn train(&mut self, data: &ArrayView2<'_, f32>, epochs: usize, learning_rate: f32) -> Result<()> {
        let mut stop = StoppingCondition::new(epochs);
        self.train_until(data, &mut stop, learning_rate, |_| {})
    }

    /// Train until the stopping condition is met, reporting every epoch
    ///
    /// # Errors
    ///
    /// Returns `EmptyDataSet` for no rows, or `ShapeMismatch` for rows of the
    /// wrong length
    pub fn train_until<F>(
        &mut self,
        data: &ArrayView2<'_, f32>,
        stop: &mut StoppingCondition,
        learning_rate: f32,
        mut on_epoch: F,
    ) -> Result<()>
    where
        F: FnMut(EpochReport),
    {
        if data.nrows() == 0 {
            return Err(empty_data_set("Rbm::train"));
        }

        while stop.is_not_done() {
            let error = self.train_epoch(data, learning_rate)?;
            stop.update(error);
            debug!(
                epoch = stop.current_epoch(),
                error,
                hidden = self.hidden_count(),
                "RBM epoch finished"
            );
            on_epoch(EpochReport {
                epoch: stop.current_epoch(),
                max_epochs: stop.max_epochs(),
                error,
            });
        }

        Ok(())
    }
}

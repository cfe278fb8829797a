//! Convolutional restricted Boltzmann machine trained by one-step contrastive divergence
//!
//! One training step per sample runs four phases:
//! 1. Positive: hidden probabilities `PH0` from the visible sample `V0`, binary
//!    hidden units `H0`, and the statistic `Grad0 = V0 ⋆ PH0`
//! 2. Reconstruct: flipped filters correlated with the hidden units, summed over
//!    filters, squashed and composited with the border of `V0` into `V1`
//! 3. Negative: `PH1` and `Grad1 = V1 ⋆ PH1` from the reconstruction
//! 4. Update: `W += rate * (Grad0 - Grad1)`
//!
//! The statistic is the correlation of the input with its own hidden
//! probabilities, which yields a kernel-sized map per filter and channel.

use ndarray::{Array1, Array2, Array3, Array4, ArrayView1, ArrayView3};
use rand::Rng;
use tracing::debug;

use crate::io::error::{Result, WithContext, empty_data_set, invalid_parameter, shape_mismatch};
use crate::math::convolution::{convolve, convolve_summed, output_edge_length};
use crate::math::stochastic::{bernoulli, logistic, logistic_in_place};
use crate::model::compositor::{composite_stack, interior_edge_length};
use crate::model::filter_bank::FilterBank;
use crate::model::stopping::StoppingCondition;

/// Hidden representation driving the visible reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HiddenSource {
    /// Bernoulli-sampled binary units `H0`
    #[default]
    Samples,
    /// Hidden probabilities `PH0`
    Probabilities,
}

/// Per-sample error reported during training
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMetric {
    /// Root-sum-of-squares of `V0 - V1`
    Reconstruction,
    /// Root-sum-of-squares of `Grad0 - Grad1`
    Gradient,
}

/// Initial bias values; biases are learned alongside the weights when present
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasConfig {
    /// Initial bias of every hidden map
    pub hidden: f32,
    /// Initial bias of every visible channel
    pub visible: f32,
}

/// Shape and behavior of one CRBM layer
#[derive(Debug, Clone, PartialEq)]
pub struct CrbmConfig {
    /// Number of filters `K`
    pub filter_count: usize,
    /// Kernel side length `F`
    pub filter_edge_length: usize,
    /// Visible side length `D`
    pub data_edge_length: usize,
    /// Input channels; more than one makes the layer depth-aware
    pub channels: usize,
    /// Scale of the uniform weight initialisation
    pub initial_weight_scale: f32,
    /// Learned hidden and visible biases
    pub bias: Option<BiasConfig>,
    /// Divide summed responses by the number of summed maps
    pub normalize_by_fan_in: bool,
    /// Hidden representation used for reconstruction
    pub reconstruction_source: HiddenSource,
    /// Error reported per sample
    pub error_metric: ErrorMetric,
}

impl CrbmConfig {
    /// Single-channel layer with unit weight scale and no biases
    pub const fn new(
        filter_count: usize,
        filter_edge_length: usize,
        data_edge_length: usize,
    ) -> Self {
        Self {
            filter_count,
            filter_edge_length,
            data_edge_length,
            channels: 1,
            initial_weight_scale: 1.0,
            bias: None,
            normalize_by_fan_in: false,
            reconstruction_source: HiddenSource::Samples,
            error_metric: ErrorMetric::Reconstruction,
        }
    }

    /// Make the layer consume a stack of `channels` maps
    ///
    /// Depth-aware layers report the gradient error.
    #[must_use]
    pub const fn depth_aware(mut self, channels: usize) -> Self {
        self.channels = channels;
        if channels > 1 {
            self.error_metric = ErrorMetric::Gradient;
        }
        self
    }

    /// Side length of every hidden map
    pub const fn hidden_edge_length(&self) -> usize {
        output_edge_length(self.data_edge_length, self.filter_edge_length)
    }

    /// Whether the layer consumes more than one channel
    pub const fn is_depth_aware(&self) -> bool {
        self.channels > 1
    }

    /// Check that every phase of a training step has a defined shape
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if a dimension is zero or the visible side is
    /// too small for the flipped backward correlation (`D < 2F - 1`)
    pub fn validate(&self) -> Result<()> {
        if self.filter_count == 0 {
            return Err(invalid_parameter(
                "filter_count",
                &self.filter_count,
                &"must be positive",
            ));
        }
        if self.channels == 0 {
            return Err(invalid_parameter(
                "channels",
                &self.channels,
                &"must be positive",
            ));
        }
        if self.filter_edge_length == 0 {
            return Err(invalid_parameter(
                "filter_edge_length",
                &self.filter_edge_length,
                &"must be positive",
            ));
        }
        if self.data_edge_length + 1 < 2 * self.filter_edge_length {
            return Err(invalid_parameter(
                "data_edge_length",
                &self.data_edge_length,
                &format!(
                    "must be at least {} for filter edge {}",
                    2 * self.filter_edge_length - 1,
                    self.filter_edge_length
                ),
            ));
        }
        Ok(())
    }
}

/// Statistics of one contrastive-divergence step, computed without mutating the layer
#[derive(Debug, Clone)]
pub struct CdStep {
    /// `Grad0` shaped like the filter bank
    pub positive: Array4<f32>,
    /// `Grad1` shaped like the filter bank
    pub negative: Array4<f32>,
    /// `mean(PH0[k]) - mean(PH1[k])` per filter
    pub hidden_bias_delta: Array1<f32>,
    /// `mean(V0[c]) - mean(V1[c])` per channel
    pub visible_bias_delta: Array1<f32>,
    /// Composited reconstruction `V1`
    pub reconstruction: Array3<f32>,
    /// Error according to the configured metric
    pub error: f32,
}

/// Progress of a finished training epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// Epochs completed, starting at 1
    pub epoch: usize,
    /// Epoch budget of the run
    pub max_epochs: usize,
    /// Mean per-sample error of the epoch
    pub error: f32,
}

/// A CRBM layer owning its filter bank
#[derive(Debug, Clone)]
pub struct Crbm {
    config: CrbmConfig,
    filters: FilterBank,
    hidden_bias: Array1<f32>,
    visible_bias: Array1<f32>,
    last_error: f32,
}

impl Crbm {
    /// Create a layer with randomly initialised filters
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the configuration is invalid
    pub fn new<R: Rng + ?Sized>(config: CrbmConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let filters = FilterBank::random(
            config.filter_count,
            config.channels,
            config.filter_edge_length,
            config.initial_weight_scale,
            rng,
        )?;
        Self::with_filters(config, filters)
    }

    /// Create a layer around an existing filter bank
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the configuration is invalid, or
    /// `ShapeMismatch` if the bank does not match it
    pub fn with_filters(config: CrbmConfig, filters: FilterBank) -> Result<Self> {
        config.validate()?;
        let expected = (
            config.filter_count,
            config.channels,
            config.filter_edge_length,
        );
        let actual = (filters.filter_count(), filters.channels(), filters.edge_length());
        if expected != actual {
            return Err(shape_mismatch(
                "Crbm::with_filters",
                &format!("{expected:?}"),
                &format!("{actual:?}"),
            ));
        }

        let (hidden, visible) = config
            .bias
            .map_or((0.0, 0.0), |bias| (bias.hidden, bias.visible));

        Ok(Self {
            hidden_bias: Array1::from_elem(config.filter_count, hidden),
            visible_bias: Array1::from_elem(config.channels, visible),
            config,
            filters,
            last_error: f32::INFINITY,
        })
    }

    /// Layer configuration
    pub const fn config(&self) -> &CrbmConfig {
        &self.config
    }

    /// Current filter bank
    pub const fn filters(&self) -> &FilterBank {
        &self.filters
    }

    /// Hidden bias per filter
    pub fn hidden_bias(&self) -> ArrayView1<'_, f32> {
        self.hidden_bias.view()
    }

    /// Visible bias per channel
    pub fn visible_bias(&self) -> ArrayView1<'_, f32> {
        self.visible_bias.view()
    }

    /// Mean error of the most recent training epoch
    pub const fn last_error(&self) -> f32 {
        self.last_error
    }

    fn check_visible(&self, visible: &ArrayView3<'_, f32>) -> Result<()> {
        let expected = (
            self.config.channels,
            self.config.data_edge_length,
            self.config.data_edge_length,
        );
        if visible.dim() != expected {
            return Err(shape_mismatch(
                "Crbm visible input",
                &format!("{expected:?}"),
                &format!("{:?}", visible.dim()),
            ));
        }
        Ok(())
    }

    fn check_hidden(&self, hidden: &ArrayView3<'_, f32>) -> Result<()> {
        let edge = self.config.hidden_edge_length();
        let expected = (self.config.filter_count, edge, edge);
        if hidden.dim() != expected {
            return Err(shape_mismatch(
                "Crbm hidden input",
                &format!("{expected:?}"),
                &format!("{:?}", hidden.dim()),
            ));
        }
        Ok(())
    }

    /// Hidden probabilities `logistic(V ⋆ W[k] + b[k])` for every filter
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `visible` is not `(channels, D, D)`
    pub fn hidden_probabilities(&self, visible: &ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        self.check_visible(visible)?;

        let edge = self.config.hidden_edge_length();
        let fan_in = self.config.channels as f32;
        let mut result = Array3::zeros((self.config.filter_count, edge, edge));

        for (k, mut target) in result.outer_iter_mut().enumerate() {
            let mut activation = convolve_summed(visible, &self.filters.filter(k))?;
            if self.config.normalize_by_fan_in {
                activation /= fan_in;
            }
            let bias = self.hidden_bias.get(k).copied().unwrap_or(0.0);
            activation += bias;
            logistic_in_place(&mut activation);
            target.assign(&activation);
        }

        Ok(result)
    }

    // Correlating a side-D visible channel with a side-(D-F+1) probability map
    // yields a side-F map, one per filter and channel
    fn statistics(
        &self,
        visible: &ArrayView3<'_, f32>,
        probabilities: &ArrayView3<'_, f32>,
    ) -> Result<Array4<f32>> {
        let edge = self.config.filter_edge_length;
        let mut result = Array4::zeros((self.config.filter_count, self.config.channels, edge, edge));

        for (mut filter, probability) in result.outer_iter_mut().zip(probabilities.outer_iter()) {
            for (mut kernel, channel) in filter.outer_iter_mut().zip(visible.outer_iter()) {
                kernel.assign(&convolve(&channel, &probability)?);
            }
        }

        Ok(result)
    }

    // Flipped filters correlated with the hidden maps, summed over filters and
    // squashed; the interior is side D - 2(F-1) before compositing
    fn reconstruct(
        &self,
        hidden: &ArrayView3<'_, f32>,
        original: Option<&ArrayView3<'_, f32>>,
    ) -> Result<Array3<f32>> {
        let flipped = self.filters.flipped();
        let edge = interior_edge_length(
            self.config.data_edge_length,
            self.config.filter_edge_length,
        );
        let fan_in = self.config.filter_count as f32;
        let mut interior = Array3::zeros((self.config.channels, edge, edge));

        for (c, mut target) in interior.outer_iter_mut().enumerate() {
            let mut sum = Array2::<f32>::zeros((edge, edge));
            for (k, map) in hidden.outer_iter().enumerate() {
                sum += &convolve(&map, &flipped.kernel(k, c))?;
            }
            if self.config.normalize_by_fan_in {
                sum /= fan_in;
            }
            sum += self.visible_bias.get(c).copied().unwrap_or(0.0);
            target.assign(&logistic(&sum));
        }

        composite_stack(original, &interior.view(), self.config.filter_edge_length)
    }

    /// Compute the statistics of one CD step for a visible sample
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `visible` is not `(channels, D, D)`
    pub fn contrastive_divergence<R: Rng + ?Sized>(
        &self,
        visible: &ArrayView3<'_, f32>,
        rng: &mut R,
    ) -> Result<CdStep> {
        let positive_probabilities = self.hidden_probabilities(visible)?;
        let positive = self.statistics(visible, &positive_probabilities.view())?;
        let hidden_samples = bernoulli(&positive_probabilities, rng);

        let driver = match self.config.reconstruction_source {
            HiddenSource::Samples => hidden_samples.view(),
            HiddenSource::Probabilities => positive_probabilities.view(),
        };
        let reconstruction = self.reconstruct(&driver, Some(visible))?;

        let negative_probabilities = self.hidden_probabilities(&reconstruction.view())?;
        let negative = self.statistics(&reconstruction.view(), &negative_probabilities.view())?;

        let error = match self.config.error_metric {
            ErrorMetric::Reconstruction => root_sum_of_squares(
                visible
                    .iter()
                    .zip(reconstruction.iter())
                    .map(|(v0, v1)| v0 - v1),
            ),
            ErrorMetric::Gradient => root_sum_of_squares(
                positive
                    .iter()
                    .zip(negative.iter())
                    .map(|(g0, g1)| g0 - g1),
            ),
        };

        let hidden_bias_delta = channel_means(&positive_probabilities.view())
            - channel_means(&negative_probabilities.view());
        let visible_bias_delta =
            channel_means(visible) - channel_means(&reconstruction.view());

        Ok(CdStep {
            positive,
            negative,
            hidden_bias_delta,
            visible_bias_delta,
            reconstruction,
            error,
        })
    }

    /// Apply the statistics of a CD step to the filter bank and biases
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the step was computed for a different layer shape
    pub fn apply(&mut self, step: &CdStep, learning_rate: f32) -> Result<()> {
        self.filters
            .apply(&step.positive.view(), &step.negative.view(), learning_rate)?;

        if self.config.bias.is_some() {
            if step.hidden_bias_delta.dim() != self.hidden_bias.dim()
                || step.visible_bias_delta.dim() != self.visible_bias.dim()
            {
                return Err(shape_mismatch(
                    "Crbm::apply",
                    &format!("{} / {} bias terms", self.hidden_bias.len(), self.visible_bias.len()),
                    &format!(
                        "{} / {}",
                        step.hidden_bias_delta.len(),
                        step.visible_bias_delta.len()
                    ),
                ));
            }
            self.hidden_bias
                .scaled_add(learning_rate, &step.hidden_bias_delta);
            self.visible_bias
                .scaled_add(learning_rate, &step.visible_bias_delta);
        }
        Ok(())
    }

    /// Run one CD step on a sample and update the layer in place
    ///
    /// Returns the per-sample error.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `visible` is not `(channels, D, D)`
    pub fn train_sample<R: Rng + ?Sized>(
        &mut self,
        visible: &ArrayView3<'_, f32>,
        learning_rate: f32,
        rng: &mut R,
    ) -> Result<f32> {
        let step = self.contrastive_divergence(visible, rng)?;
        self.apply(&step, learning_rate)?;
        Ok(step.error)
    }

    /// Train on every sample once, in order, updating after each sample
    ///
    /// Returns the mean per-sample error.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDataSet` for no samples, or `ShapeMismatch` naming the
    /// first sample with the wrong shape
    pub fn train_epoch<R: Rng + ?Sized>(
        &mut self,
        samples: &[Array3<f32>],
        learning_rate: f32,
        rng: &mut R,
    ) -> Result<f32> {
        if samples.is_empty() {
            return Err(empty_data_set("Crbm::train_epoch"));
        }

        let mut total = 0.0;
        for (index, sample) in samples.iter().enumerate() {
            total += self
                .train_sample(&sample.view(), learning_rate, rng)
                .with_sample(index)?;
        }

        self.last_error = total / samples.len() as f32;
        Ok(self.last_error)
    }

    /// Train for a fixed number of epochs
    ///
    /// # Errors
    ///
    /// Returns `EmptyDataSet` for no samples, or `ShapeMismatch` for a sample
    /// with the wrong shape
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        samples: &[Array3<f32>],
        epochs: usize,
        learning_rate: f32,
        rng: &mut R,
    ) -> Result<()> {
        let mut stop = StoppingCondition::new(epochs);
        self.train_until(samples, &mut stop, learning_rate, rng, |_| {})
    }

    /// Train until the stopping condition is met, reporting every epoch
    ///
    /// # Errors
    ///
    /// Returns `EmptyDataSet` for no samples, or `ShapeMismatch` for a sample
    /// with the wrong shape
    pub fn train_until<R, F>(
        &mut self,
        samples: &[Array3<f32>],
        stop: &mut StoppingCondition,
        learning_rate: f32,
        rng: &mut R,
        mut on_epoch: F,
    ) -> Result<()>
    where
        R: Rng + ?Sized,
        F: FnMut(EpochReport),
    {
        if samples.is_empty() {
            return Err(empty_data_set("Crbm::train"));
        }

        while stop.is_not_done() {
            let error = self.train_epoch(samples, learning_rate, rng)?;
            stop.update(error);
            debug!(
                epoch = stop.current_epoch(),
                error,
                filters = self.config.filter_count,
                "CRBM epoch finished"
            );
            on_epoch(EpochReport {
                epoch: stop.current_epoch(),
                max_epochs: stop.max_epochs(),
                error,
            });
        }

        Ok(())
    }

    /// Bernoulli-sampled hidden maps for every sample
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` naming the first sample with the wrong shape
    pub fn get_hidden<R: Rng + ?Sized>(
        &self,
        samples: &[Array3<f32>],
        rng: &mut R,
    ) -> Result<Vec<Array3<f32>>> {
        samples
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                self.hidden_probabilities(&sample.view())
                    .map(|probabilities| bernoulli(&probabilities, rng))
                    .with_sample(index)
            })
            .collect()
    }

    /// Hidden probabilities for every sample, without sampling
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` naming the first sample with the wrong shape
    pub fn get_hidden_probabilities(&self, samples: &[Array3<f32>]) -> Result<Vec<Array3<f32>>> {
        samples
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                self.hidden_probabilities(&sample.view())
                    .with_sample(index)
            })
            .collect()
    }

    /// Reconstruct a visible stack from hidden maps without a CD step
    ///
    /// Border cells come from `original` when given, otherwise they repeat the
    /// nearest reconstructed edge value.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `hidden` is not `(K, D-F+1, D-F+1)` or the
    /// original does not match the visible shape
    pub fn get_visible(
        &self,
        hidden: &ArrayView3<'_, f32>,
        original: Option<&ArrayView3<'_, f32>>,
    ) -> Result<Array3<f32>> {
        self.check_hidden(hidden)?;
        if let Some(source) = original {
            self.check_visible(source)?;
        }
        self.reconstruct(hidden, original)
    }
}

fn root_sum_of_squares(values: impl Iterator<Item = f32>) -> f32 {
    values.map(|value| value * value).sum::<f32>().sqrt()
}

fn channel_means(stack: &ArrayView3<'_, f32>) -> Array1<f32> {
    stack
        .outer_iter()
        .map(|channel| channel.mean().unwrap_or(0.0))
        .collect()
}

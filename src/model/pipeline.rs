//! Layer-wise training of stacked CRBMs and feature extraction
//!
//! Each layer is trained to completion on the pooled output of the previous one.
//! The first layer sees single-channel samples; every later layer is depth-aware
//! and consumes the previous layer's pooled channel stack. The pooled stack of
//! the last layer, flattened channel-major, is the feature vector of a sample.
//! An optional dense RBM trained on those vectors replaces them by its hidden
//! probabilities.

use ndarray::{Array1, Array2, Array3};
use rand::Rng;
use tracing::info;

use crate::io::error::{Result, empty_data_set, invalid_parameter};
use crate::math::stochastic::bernoulli;
use crate::model::crbm::{BiasConfig, Crbm, CrbmConfig, EpochReport, HiddenSource};
use crate::model::pooling::{Pooler, PoolingPolicy, pooled_edge_length};
use crate::model::rbm::Rbm;
use crate::model::sample::{flatten, single_channel, split_rows, stack_rows};
use crate::model::stopping::StoppingCondition;

/// Hidden representation passed on to pooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureMode {
    /// Bernoulli-sampled hidden units
    #[default]
    Sampled,
    /// Hidden probabilities
    Probabilities,
}

/// Training parameters of one stacked layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerConfig {
    /// Number of filters `K`
    pub filter_count: usize,
    /// Kernel side length `F`
    pub filter_edge_length: usize,
    /// Pooling block side after this layer
    pub pooling_size: usize,
    /// Epoch budget
    pub epochs: usize,
    /// Contrastive-divergence learning rate
    pub learning_rate: f32,
    /// Stop early once the mean epoch error reaches this value
    pub convergence_error: Option<f32>,
    /// Learned biases
    pub bias: Option<BiasConfig>,
    /// Divide summed responses by the number of summed maps
    pub normalize_by_fan_in: bool,
    /// Hidden representation used for reconstruction
    pub reconstruction_source: HiddenSource,
}

impl LayerConfig {
    /// Layer without biases, normalisation or early stopping
    pub const fn new(
        filter_count: usize,
        filter_edge_length: usize,
        pooling_size: usize,
        epochs: usize,
        learning_rate: f32,
    ) -> Self {
        Self {
            filter_count,
            filter_edge_length,
            pooling_size,
            epochs,
            learning_rate,
            convergence_error: None,
            bias: None,
            normalize_by_fan_in: false,
            reconstruction_source: HiddenSource::Samples,
        }
    }
}

/// Training parameters of the dense RBM stage
#[derive(Debug, Clone, PartialEq)]
pub struct DenseConfig {
    /// Number of hidden units, the final feature length
    pub hidden_count: usize,
    /// Epoch budget
    pub epochs: usize,
    /// Contrastive-divergence learning rate
    pub learning_rate: f32,
    /// Stop early once the epoch error reaches this value
    pub convergence_error: Option<f32>,
}

impl DenseConfig {
    /// Stage without early stopping
    pub const fn new(hidden_count: usize, epochs: usize, learning_rate: f32) -> Self {
        Self {
            hidden_count,
            epochs,
            learning_rate,
            convergence_error: None,
        }
    }
}

/// Shape of the whole stack
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Side length of the input samples
    pub data_edge_length: usize,
    /// Layers from input to output
    pub layers: Vec<LayerConfig>,
    /// Cross-channel pooling policy shared by all layers
    pub pooling_policy: PoolingPolicy,
    /// Hidden representation passed on to pooling
    pub feature_mode: FeatureMode,
    /// Scale of the uniform weight initialisation
    pub initial_weight_scale: f32,
    /// Dense RBM applied to the flattened features
    pub dense: Option<DenseConfig>,
}

impl PipelineConfig {
    /// Two identical layers, the arrangement used for feature learning
    pub fn two_layer(data_edge_length: usize, layer: LayerConfig) -> Self {
        Self {
            data_edge_length,
            layers: vec![layer.clone(), layer],
            pooling_policy: PoolingPolicy::PerChannel,
            feature_mode: FeatureMode::Sampled,
            initial_weight_scale: 1.0,
            dense: None,
        }
    }

    /// Derive the CRBM configuration of every layer
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if there are no layers, a pooling size is
    /// zero, or a layer's input is too small for its filters
    pub fn layer_configs(&self) -> Result<Vec<CrbmConfig>> {
        if self.layers.is_empty() {
            return Err(invalid_parameter("layers", &0, &"at least one layer is required"));
        }

        let mut edge = self.data_edge_length;
        let mut channels = 1;
        let mut configs = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            if layer.pooling_size == 0 {
                return Err(invalid_parameter(
                    "pooling_size",
                    &layer.pooling_size,
                    &"must be positive",
                ));
            }

            let mut config = CrbmConfig::new(layer.filter_count, layer.filter_edge_length, edge)
                .depth_aware(channels);
            config.initial_weight_scale = self.initial_weight_scale;
            config.bias = layer.bias;
            config.normalize_by_fan_in = layer.normalize_by_fan_in;
            config.reconstruction_source = layer.reconstruction_source;
            config.validate()?;

            edge = pooled_edge_length(config.hidden_edge_length(), layer.pooling_size);
            channels = layer.filter_count;
            configs.push(config);
        }

        Ok(configs)
    }

    /// Length of the final feature vector, the dense hidden count when that
    /// stage is configured
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` under the same conditions as [`Self::layer_configs`]
    pub fn feature_length(&self) -> Result<usize> {
        let pooled = self.pooled_feature_length()?;
        Ok(self.dense.as_ref().map_or(pooled, |dense| dense.hidden_count))
    }

    /// Length of the flattened pooled stack of the last layer
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` under the same conditions as [`Self::layer_configs`]
    pub fn pooled_feature_length(&self) -> Result<usize> {
        let configs = self.layer_configs()?;
        let last = configs
            .last()
            .zip(self.layers.last())
            .map_or(0, |(config, layer)| {
                let edge = pooled_edge_length(config.hidden_edge_length(), layer.pooling_size);
                config.filter_count * edge * edge
            });
        Ok(last)
    }
}

/// Receives progress while a stack is trained
///
/// The dense stage reports as the layer after the last CRBM.
pub trait TrainingMonitor {
    /// A layer is about to train for at most `max_epochs`
    fn layer_started(&mut self, _layer: usize, _max_epochs: usize) {}

    /// A layer finished an epoch
    fn epoch_finished(&mut self, _layer: usize, _report: EpochReport) {}

    /// A layer finished training with the given final error
    fn layer_finished(&mut self, _layer: usize, _error: f32) {}
}

impl TrainingMonitor for () {}

/// Intermediate maps of one layer for every sample
#[derive(Debug, Clone, Default)]
pub struct LayerTrace {
    /// Hidden maps before pooling
    pub hidden: Vec<Array3<f32>>,
    /// Pooled maps fed to the next layer
    pub pooled: Vec<Array3<f32>>,
}

/// Everything produced by passing samples through the stack
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Per-layer maps, input side first
    pub layers: Vec<LayerTrace>,
    /// Final feature vector per sample
    pub features: Vec<Array1<f32>>,
}

/// Stacked CRBM layers with a pooler after each and an optional dense RBM
#[derive(Debug, Clone)]
pub struct StackedPipeline {
    config: PipelineConfig,
    layers: Vec<Crbm>,
    poolers: Vec<Pooler>,
    dense: Option<Rbm>,
}

impl StackedPipeline {
    /// Create an untrained stack with random filters
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the configuration is invalid
    pub fn new<R: Rng + ?Sized>(config: PipelineConfig, rng: &mut R) -> Result<Self> {
        let configs = config.layer_configs()?;

        let layers = configs
            .into_iter()
            .map(|layer| Crbm::new(layer, rng))
            .collect::<Result<Vec<_>>>()?;
        let poolers = config
            .layers
            .iter()
            .map(|layer| Pooler::new(layer.pooling_size, config.pooling_policy))
            .collect::<Result<Vec<_>>>()?;
        let dense = match config.dense {
            Some(ref dense) => Some(Rbm::new(
                config.pooled_feature_length()?,
                dense.hidden_count,
                rng,
            )?),
            None => None,
        };

        Ok(Self {
            config,
            layers,
            poolers,
            dense,
        })
    }

    /// Stack configuration
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Trained layers, input side first
    pub fn layers(&self) -> &[Crbm] {
        &self.layers
    }

    /// Dense stage, if configured
    pub const fn dense(&self) -> Option<&Rbm> {
        self.dense.as_ref()
    }

    /// Number of trained stages, CRBM layers plus the dense stage
    pub fn stage_count(&self) -> usize {
        self.layers.len() + usize::from(self.dense.is_some())
    }

    /// Train every layer in turn and return the maps and features of the samples
    ///
    /// # Errors
    ///
    /// Returns `EmptyDataSet` for no samples, or `ShapeMismatch` for a sample
    /// that is not `D × D`
    pub fn train<R, M>(
        &mut self,
        samples: &[Array2<f32>],
        rng: &mut R,
        monitor: &mut M,
    ) -> Result<PipelineOutput>
    where
        R: Rng + ?Sized,
        M: TrainingMonitor + ?Sized,
    {
        if samples.is_empty() {
            return Err(empty_data_set("StackedPipeline::train"));
        }

        let mut inputs: Vec<Array3<f32>> = samples.iter().cloned().map(single_channel).collect();
        let mut output = PipelineOutput::default();
        let mode = self.config.feature_mode;

        for (index, ((layer, pooler), settings)) in self
            .layers
            .iter_mut()
            .zip(&self.poolers)
            .zip(&self.config.layers)
            .enumerate()
        {
            info!(
                layer = index,
                samples = inputs.len(),
                channels = layer.config().channels,
                edge = layer.config().data_edge_length,
                "Training CRBM layer"
            );
            monitor.layer_started(index, settings.epochs);

            let mut stop = StoppingCondition::new(settings.epochs);
            if let Some(threshold) = settings.convergence_error {
                stop = stop.with_convergence_error(threshold);
            }
            layer.train_until(&inputs, &mut stop, settings.learning_rate, rng, |report| {
                monitor.epoch_finished(index, report);
            })?;

            monitor.layer_finished(index, layer.last_error());
            info!(layer = index, error = layer.last_error(), "CRBM layer trained");

            let trace = forward_layer(layer, pooler, &inputs, mode, rng)?;
            inputs.clone_from(&trace.pooled);
            output.layers.push(trace);
        }

        let flattened: Vec<Array1<f32>> = inputs.iter().map(|stack| flatten(&stack.view())).collect();
        let stage = self.layers.len();
        output.features = match (self.dense.as_mut(), self.config.dense.as_ref()) {
            (Some(rbm), Some(settings)) => {
                let matrix = stack_rows(&flattened)?;
                info!(
                    visible = rbm.visible_count(),
                    hidden = rbm.hidden_count(),
                    "Training dense RBM"
                );
                monitor.layer_started(stage, settings.epochs);

                let mut stop = StoppingCondition::new(settings.epochs);
                if let Some(threshold) = settings.convergence_error {
                    stop = stop.with_convergence_error(threshold);
                }
                rbm.train_until(&matrix.view(), &mut stop, settings.learning_rate, |report| {
                    monitor.epoch_finished(stage, report);
                })?;

                monitor.layer_finished(stage, rbm.last_error());
                info!(error = rbm.last_error(), "Dense RBM trained");
                split_rows(&rbm.get_hidden(&matrix.view())?.view())
            }
            _ => flattened,
        };
        Ok(output)
    }

    /// Pass samples through the trained stack without training
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` for a sample that is not `D × D`, or
    /// `EmptyDataSet` for no samples when the dense stage is configured
    pub fn transform<R: Rng + ?Sized>(
        &self,
        samples: &[Array2<f32>],
        rng: &mut R,
    ) -> Result<PipelineOutput> {
        let mut inputs: Vec<Array3<f32>> = samples.iter().cloned().map(single_channel).collect();
        let mut output = PipelineOutput::default();

        for (layer, pooler) in self.layers.iter().zip(&self.poolers) {
            let trace = forward_layer(layer, pooler, &inputs, self.config.feature_mode, rng)?;
            inputs.clone_from(&trace.pooled);
            output.layers.push(trace);
        }

        let flattened: Vec<Array1<f32>> = inputs.iter().map(|stack| flatten(&stack.view())).collect();
        output.features = match self.dense {
            Some(ref rbm) => split_rows(&rbm.get_hidden(&stack_rows(&flattened)?.view())?.view()),
            None => flattened,
        };
        Ok(output)
    }

    /// Feature vectors of samples passed through the trained stack
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` for a sample that is not `D × D`, or
    /// `EmptyDataSet` for no samples when the dense stage is configured
    pub fn features<R: Rng + ?Sized>(
        &self,
        samples: &[Array2<f32>],
        rng: &mut R,
    ) -> Result<Vec<Array1<f32>>> {
        self.transform(samples, rng).map(|output| output.features)
    }
}

fn forward_layer<R: Rng + ?Sized>(
    layer: &Crbm,
    pooler: &Pooler,
    inputs: &[Array3<f32>],
    mode: FeatureMode,
    rng: &mut R,
) -> Result<LayerTrace> {
    let probabilities = layer.get_hidden_probabilities(inputs)?;
    let hidden = match mode {
        FeatureMode::Sampled => probabilities
            .iter()
            .map(|stack| bernoulli(stack, rng))
            .collect(),
        FeatureMode::Probabilities => probabilities,
    };

    let config = layer.config();
    let pooled = hidden
        .iter()
        .map(|stack| {
            pooler.max_pool_layer(
                &stack.view(),
                config.data_edge_length,
                config.filter_edge_length,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LayerTrace { hidden, pooled })
}

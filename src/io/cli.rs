//! Command-line interface for training a CRBM stack on an image directory

use crate::cluster::cluster::Cluster;
use crate::cluster::evaluation::{Evaluation, assign_majority_labels, check_clusters, label_clusters};
use crate::cluster::lbg::{LbgConfig, split_clusters};
use crate::io::configuration::{
    DEFAULT_EDGE_LENGTH, DEFAULT_EPOCHS, DEFAULT_FILTER_COUNT, DEFAULT_FILTER_EDGE_LENGTH,
    DEFAULT_LEARNING_RATE, DEFAULT_MAX_CLUSTERS, DEFAULT_MAX_DATA, DEFAULT_MIN_DATA,
    DEFAULT_PADDING, DEFAULT_POOLING_SIZE, DEFAULT_SEED, DEFAULT_WEIGHT_SCALE,
};
use crate::io::dataset::{SampleFormat, into_parts, load_directory};
use crate::io::error::{Result, invalid_parameter};
use crate::io::image::export_stack_as_png;
use crate::io::progress::ProgressManager;
use crate::model::crbm::Crbm;
use crate::model::pipeline::{
    DenseConfig, FeatureMode, LayerConfig, PipelineConfig, PipelineOutput, StackedPipeline,
};
use crate::model::pooling::PoolingPolicy;
use crate::model::rbm::Rbm;
use crate::model::sample::single_channel;
use clap::Parser;
use ndarray::{Array1, Array2, Array3};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "crbm")]
#[command(
    author,
    version,
    about = "Learn convolutional RBM features from labeled images and score them by clustering"
)]
/// Command-line arguments for the training tool
// Sample preparation and pooling each expose independent switches
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Directory of training images named `<label>_<anything>.<png|jpg|gif>`
    #[arg(value_name = "TRAIN_DIR")]
    pub train: PathBuf,

    /// Directory of held-out images to evaluate against the clusters
    #[arg(short, long, value_name = "TEST_DIR")]
    pub test: Option<PathBuf>,

    /// Random seed for reproducible training
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Epoch budget per layer
    #[arg(short, long, default_value_t = DEFAULT_EPOCHS)]
    pub epochs: usize,

    /// Contrastive-divergence learning rate
    #[arg(short, long, default_value_t = DEFAULT_LEARNING_RATE)]
    pub learning_rate: f32,

    /// Stop a layer early once its mean epoch error reaches this value
    #[arg(long)]
    pub convergence_error: Option<f32>,

    /// Filters per layer
    #[arg(short = 'k', long, default_value_t = DEFAULT_FILTER_COUNT)]
    pub filters: usize,

    /// Side length of each filter
    #[arg(short = 'f', long, default_value_t = DEFAULT_FILTER_EDGE_LENGTH)]
    pub filter_edge_length: usize,

    /// Side length of the pooling blocks
    #[arg(short, long, default_value_t = DEFAULT_POOLING_SIZE)]
    pub pooling: usize,

    /// Number of stacked layers
    #[arg(long, default_value_t = 2)]
    pub layers: usize,

    /// Keep only the strongest channel per pooled location
    #[arg(short, long)]
    pub winner_take_all: bool,

    /// Pool hidden probabilities instead of sampled hidden units
    #[arg(long)]
    pub probabilities: bool,

    /// Reduce the features through a dense RBM with this many hidden units
    #[arg(long, value_name = "HIDDEN")]
    pub dense: Option<usize>,

    /// Side length images are resampled to
    #[arg(long, default_value_t = DEFAULT_EDGE_LENGTH)]
    pub edge_length: usize,

    /// Zero border added around every image
    #[arg(long, default_value_t = DEFAULT_PADDING)]
    pub padding: usize,

    /// Threshold grey levels to 0 or 1
    #[arg(short, long)]
    pub binarize: bool,

    /// Keep light pixels high instead of inverting
    #[arg(long)]
    pub no_invert: bool,

    /// Cluster without labels by LBG splitting down to this total distance
    #[arg(long, value_name = "THRESHOLD")]
    pub lbg: Option<f32>,

    /// Upper bound on LBG clusters
    #[arg(long, default_value_t = DEFAULT_MAX_CLUSTERS)]
    pub max_clusters: usize,

    /// Directory to write filters and feature maps to
    #[arg(short = 'x', long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Sample preparation selected by the flags
    pub const fn sample_format(&self) -> SampleFormat {
        SampleFormat {
            edge_length: self.edge_length,
            padding: self.padding,
            binarize: self.binarize,
            invert: !self.no_invert,
            min_data: DEFAULT_MIN_DATA,
            max_data: DEFAULT_MAX_DATA,
        }
    }

    /// Stack configuration selected by the flags
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if no layers are requested
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        if self.layers == 0 {
            return Err(invalid_parameter("layers", &self.layers, &"must be positive"));
        }

        let mut layer = LayerConfig::new(
            self.filters,
            self.filter_edge_length,
            self.pooling,
            self.epochs,
            self.learning_rate,
        );
        layer.convergence_error = self.convergence_error;

        Ok(PipelineConfig {
            data_edge_length: self.sample_format().padded_edge_length(),
            layers: vec![layer; self.layers],
            pooling_policy: if self.winner_take_all {
                PoolingPolicy::WinnerTakeAll
            } else {
                PoolingPolicy::PerChannel
            },
            feature_mode: if self.probabilities {
                FeatureMode::Probabilities
            } else {
                FeatureMode::Sampled
            },
            initial_weight_scale: DEFAULT_WEIGHT_SCALE,
            dense: self.dense.map(|hidden_count| DenseConfig {
                convergence_error: self.convergence_error,
                ..DenseConfig::new(hidden_count, self.epochs, self.learning_rate)
            }),
        })
    }
}

/// Results of one training run
#[derive(Debug)]
pub struct RunSummary {
    /// Final mean epoch error per layer
    pub layer_errors: Vec<f32>,
    /// Final error of the dense stage, if configured
    pub dense_error: Option<f32>,
    /// Clusters built over the training features
    pub clusters: Vec<Cluster>,
    /// Scores of the evaluation set against the clusters
    pub evaluation: Evaluation,
}

/// Orchestrates loading, training, clustering and evaluation
pub struct TrainingRunner {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl TrainingRunner {
    /// Create a new runner with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Train, cluster and evaluate according to the CLI arguments
    ///
    /// Without a test directory the training samples are scored.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, training, clustering or export fails
    pub fn run(&mut self) -> Result<RunSummary> {
        let format = self.cli.sample_format();
        let config = self.cli.pipeline_config()?;
        let mut rng = StdRng::seed_from_u64(self.cli.seed);

        let (train_data, train_labels) = into_parts(load_directory(&self.cli.train, &format)?);
        let mut pipeline = StackedPipeline::new(config, &mut rng)?;

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(pipeline.stage_count());
        }
        let output = match self.progress_manager {
            Some(ref mut pm) => pipeline.train(&train_data, &mut rng, pm)?,
            None => pipeline.train(&train_data, &mut rng, &mut ())?,
        };
        if let Some(ref pm) = self.progress_manager {
            pm.finish();
        }

        let layer_errors: Vec<f32> = pipeline.layers().iter().map(Crbm::last_error).collect();
        let dense_error = pipeline.dense().map(Rbm::last_error);

        if let Some(ref directory) = self.cli.export {
            Self::export(&pipeline, &train_data, &output, directory)?;
        }

        let clusters = self.cluster(&output.features, &train_labels, &mut rng)?;

        let evaluation = match self.cli.test {
            Some(ref test) => {
                let (test_data, test_labels) = into_parts(load_directory(test, &format)?);
                let test_features = pipeline.features(&test_data, &mut rng)?;
                check_clusters(&clusters, &test_features, &test_labels)?
            }
            None => check_clusters(&clusters, &output.features, &train_labels)?,
        };

        info!(
            clusters = clusters.len(),
            misclassified = evaluation.misclassified,
            samples = evaluation.samples,
            error = evaluation.misclassification_rate,
            mean_rank = evaluation.mean_rank,
            mean_reciprocal_rank = evaluation.mean_reciprocal_rank,
            accuracy = evaluation.confusion.accuracy(),
            "Evaluation finished"
        );

        Ok(RunSummary {
            layer_errors,
            dense_error,
            clusters,
            evaluation,
        })
    }

    fn cluster(
        &self,
        features: &[Array1<f32>],
        labels: &[String],
        rng: &mut StdRng,
    ) -> Result<Vec<Cluster>> {
        match self.cli.lbg {
            Some(threshold) => {
                let config = LbgConfig {
                    max_clusters: self.cli.max_clusters,
                    ..LbgConfig::new(threshold)
                };
                let mut clusters = split_clusters(features, &config, rng)?;
                assign_majority_labels(&mut clusters, labels);
                info!(clusters = clusters.len(), threshold, "LBG clustering finished");
                Ok(clusters)
            }
            None => label_clusters(features, labels),
        }
    }

    // Layout: <dir>/layer<i>/{filters,hidden,pooled,visible,visible_free}
    // `visible` takes its border from the layer input, `visible_free` repeats
    // the reconstructed edge
    fn export(
        pipeline: &StackedPipeline,
        samples: &[Array2<f32>],
        output: &PipelineOutput,
        directory: &Path,
    ) -> Result<()> {
        let mut inputs: Vec<Array3<f32>> = samples.iter().cloned().map(single_channel).collect();

        for (index, (layer, trace)) in pipeline.layers().iter().zip(&output.layers).enumerate() {
            let layer_directory = directory.join(format!("layer{index}"));

            let filters = layer.filters();
            for filter in 0..filters.filter_count() {
                export_stack_as_png(&filters.filter(filter), &layer_directory.join("filters"), filter)?;
            }
            for (sample, (hidden, input)) in trace.hidden.iter().zip(&inputs).enumerate() {
                export_stack_as_png(&hidden.view(), &layer_directory.join("hidden"), sample)?;

                let anchored = layer.get_visible(&hidden.view(), Some(&input.view()))?;
                export_stack_as_png(&anchored.view(), &layer_directory.join("visible"), sample)?;
                let free = layer.get_visible(&hidden.view(), None)?;
                export_stack_as_png(&free.view(), &layer_directory.join("visible_free"), sample)?;
            }
            for (sample, pooled) in trace.pooled.iter().enumerate() {
                export_stack_as_png(&pooled.view(), &layer_directory.join("pooled"), sample)?;
            }

            inputs.clone_from(&trace.pooled);
        }

        info!(directory = %directory.display(), "Exported feature maps");
        Ok(())
    }
}

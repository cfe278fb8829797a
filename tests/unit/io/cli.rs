//! Tests for argument parsing and the end-to-end training runner

#[cfg(test)]
mod tests {
    use clap::Parser;
    use crbm::io::cli::{Cli, TrainingRunner};
    use crbm::io::configuration::{DEFAULT_EPOCHS, DEFAULT_FILTER_COUNT, DEFAULT_SEED};
    use crbm::model::pipeline::FeatureMode;
    use crbm::model::pooling::PoolingPolicy;
    use image::{GrayImage, Luma};
    use std::path::Path;

    fn write_digits(directory: &Path) {
        for (label, offset) in [("a", 0), ("b", 4)] {
            for index in 0..2 {
                let image = GrayImage::from_fn(8, 8, |x, y| {
                    if (x + y + offset + index) % 8 < 4 {
                        Luma([0])
                    } else {
                        Luma([255])
                    }
                });
                image
                    .save(directory.join(format!("{label}_{index}.png")))
                    .unwrap();
            }
        }
    }

    fn small_args(train: &Path) -> Vec<String> {
        [
            "crbm",
            train.to_str().unwrap(),
            "--quiet",
            "--edge-length",
            "8",
            "--padding",
            "2",
            "-k",
            "2",
            "-f",
            "3",
            "--epochs",
            "1",
        ]
        .iter()
        .map(ToString::to_string)
        .collect()
    }

    // Tests defaults come from the configuration constants
    // Verified by changing a default_value_t
    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["crbm", "train"]).unwrap();
        assert_eq!(cli.seed, DEFAULT_SEED);
        assert_eq!(cli.epochs, DEFAULT_EPOCHS);
        assert_eq!(cli.filters, DEFAULT_FILTER_COUNT);
        assert!(cli.test.is_none());
        assert!(cli.should_show_progress());
        assert!(cli.sample_format().invert);
    }

    // Tests pooling and feature switches reach the stack configuration
    // Verified by ignoring the winner-take-all flag
    #[test]
    fn test_pipeline_config_flags() {
        let cli = Cli::try_parse_from([
            "crbm",
            "train",
            "--winner-take-all",
            "--probabilities",
            "--layers",
            "3",
            "--no-invert",
        ])
        .unwrap();
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.pooling_policy, PoolingPolicy::WinnerTakeAll);
        assert_eq!(config.feature_mode, FeatureMode::Probabilities);
        assert_eq!(config.layers.len(), 3);
        assert_eq!(config.data_edge_length, 32);
        assert!(!cli.sample_format().invert);
    }

    // Tests zero layers are rejected
    // Verified by building an empty stack
    #[test]
    fn test_zero_layers() {
        let cli = Cli::try_parse_from(["crbm", "train", "--layers", "0"]).unwrap();
        assert!(cli.pipeline_config().is_err());
    }

    // Tests a labeled run clusters per label and scores the training set
    // Verified by clustering test features instead of training features
    #[test]
    fn test_labeled_run() {
        let train = tempfile::tempdir().unwrap();
        write_digits(train.path());
        let export = tempfile::tempdir().unwrap();

        let mut args = small_args(train.path());
        args.push("--export".to_string());
        args.push(export.path().to_string_lossy().to_string());
        let mut runner = TrainingRunner::new(Cli::try_parse_from(args).unwrap());
        let summary = runner.run().unwrap();

        assert_eq!(summary.layer_errors.len(), 2);
        assert_eq!(summary.clusters.len(), 2);
        assert_eq!(summary.evaluation.samples, 4);
        assert!(export.path().join("layer0").join("filters").join("0_0.png").exists());
        assert!(export.path().join("layer1").join("pooled").join("3_1.png").exists());
        assert!(export.path().join("layer0").join("visible").join("3_0.png").exists());
        assert!(export.path().join("layer0").join("visible_free").join("0_0.png").exists());
        assert!(export.path().join("layer1").join("visible").join("0_1.png").exists());
        assert!(summary.dense_error.is_none());
    }

    // Tests the dense flag adds a stage that sets the feature length
    // Verified by clustering the pooled stack instead of dense features
    #[test]
    fn test_dense_run() {
        let train = tempfile::tempdir().unwrap();
        write_digits(train.path());

        let mut args = small_args(train.path());
        args.extend(["--dense", "3"].iter().map(ToString::to_string));
        let cli = Cli::try_parse_from(args).unwrap();
        let dense = cli.pipeline_config().unwrap().dense.unwrap();
        assert_eq!((dense.hidden_count, dense.epochs), (3, 1));

        let summary = TrainingRunner::new(cli).run().unwrap();

        assert!(summary.dense_error.is_some_and(f32::is_finite));
        assert!(
            summary
                .clusters
                .iter()
                .all(|cluster| cluster.center().is_some_and(|center| center.len() == 3))
        );
    }

    // Tests an unsupervised run with a held-out directory
    // Verified by evaluating on the training directory
    #[test]
    fn test_lbg_run_with_test_directory() {
        let train = tempfile::tempdir().unwrap();
        write_digits(train.path());
        let test = tempfile::tempdir().unwrap();
        GrayImage::from_pixel(8, 8, Luma([255]))
            .save(test.path().join("a_9.png"))
            .unwrap();

        let mut args = small_args(train.path());
        args.extend(
            ["--lbg", "1000000", "--test"]
                .iter()
                .map(ToString::to_string),
        );
        args.push(test.path().to_string_lossy().to_string());
        let mut runner = TrainingRunner::new(Cli::try_parse_from(args).unwrap());
        let summary = runner.run().unwrap();

        assert_eq!(summary.clusters.len(), 1);
        assert_eq!(summary.evaluation.samples, 1);
        assert_eq!(summary.clusters[0].members().len(), 4);
    }

    // Tests a missing training directory fails
    // Verified by treating a missing directory as empty
    #[test]
    fn test_missing_training_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let cli = Cli::try_parse_from(small_args(&missing)).unwrap();
        assert!(TrainingRunner::new(cli).run().is_err());
    }
}

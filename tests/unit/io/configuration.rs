//! Tests for default constants

#[cfg(test)]
mod tests {
    use crbm::io::configuration::{
        DEFAULT_EDGE_LENGTH, DEFAULT_FILTER_EDGE_LENGTH, DEFAULT_LEARNING_RATE, DEFAULT_MAX_DATA,
        DEFAULT_MIN_DATA, DEFAULT_PADDING, DEFAULT_POOLING_SIZE, SAMPLE_EXTENSIONS,
    };
    use crbm::model::crbm::CrbmConfig;
    use crbm::model::pipeline::{LayerConfig, PipelineConfig};

    // Tests padding lets the filtered map keep the image size
    // Verified by changing padding to one
    #[test]
    fn test_padding_preserves_image_size() {
        let padded = DEFAULT_EDGE_LENGTH + 2 * DEFAULT_PADDING;
        let config = CrbmConfig::new(1, DEFAULT_FILTER_EDGE_LENGTH, padded);
        assert_eq!(config.hidden_edge_length(), DEFAULT_EDGE_LENGTH);
    }

    // Tests the default two-layer stack is valid
    // Verified by raising the default pooling size to four
    #[test]
    fn test_default_stack_is_valid() {
        let layer = LayerConfig::new(
            15,
            DEFAULT_FILTER_EDGE_LENGTH,
            DEFAULT_POOLING_SIZE,
            1,
            DEFAULT_LEARNING_RATE,
        );
        let config = PipelineConfig::two_layer(DEFAULT_EDGE_LENGTH + 2 * DEFAULT_PADDING, layer);
        assert!(config.layer_configs().is_ok());
    }

    // Tests the data range and accepted formats
    // Verified by swapping the range bounds
    #[test]
    fn test_data_defaults() {
        assert!(DEFAULT_MIN_DATA < DEFAULT_MAX_DATA);
        assert!(SAMPLE_EXTENSIONS.contains(&"png"));
    }
}

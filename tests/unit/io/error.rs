//! Tests for error types including source chaining and message formatting

#[cfg(test)]
mod tests {
    use crbm::CrbmError;
    use crbm::io::error::{WithContext, empty_data_set, invalid_parameter, shape_mismatch};
    use std::error::Error;

    // Tests error source chaining works correctly
    // Verified by breaking source chain
    #[test]
    fn test_error_source_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = CrbmError::FileSystem {
            path: "/tmp/digits".into(),
            operation: "read directory",
            source: io_error,
        };

        assert!(error.source().is_some());
        assert!(error.to_string().contains("read directory"));
    }

    // Tests shape errors name the operation and the sample
    // Verified by omitting the sample from the message
    #[test]
    fn test_shape_mismatch_message() {
        let error = shape_mismatch("convolve", &"5x5", &"4x5");
        assert!(error.source().is_none());

        let result: Result<(), CrbmError> = Err(error);
        let message = result.with_sample(3).unwrap_err().to_string();
        assert!(message.contains("convolve"));
        assert!(message.contains("4x5"));
        assert!(message.contains("sample 3"));
    }

    // Tests InvalidParameter error contains all fields
    // Verified by omitting value from message
    #[test]
    fn test_invalid_parameter_error() {
        let message = invalid_parameter("pooling_size", &0, &"must be positive").to_string();
        assert!(message.contains("pooling_size"));
        assert!(message.contains('0'));
        assert!(message.contains("must be positive"));
    }

    // Tests empty data and degenerate cluster messages
    // Verified by swapping the two messages
    #[test]
    fn test_data_errors() {
        assert!(empty_data_set("split_clusters").to_string().contains("split_clusters"));
        assert!(
            CrbmError::DegenerateCluster { index: 2 }
                .to_string()
                .contains("Cluster 2")
        );
    }

    // Tests ImageExport error with IO source
    // Verified by excluding source error from message
    #[test]
    fn test_image_export_error() {
        let image_error = image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "access denied",
        ));
        let error = CrbmError::ImageExport {
            path: "/export/0_0.png".into(),
            source: image_error,
        };

        assert!(error.to_string().contains("access denied"));
        assert!(error.source().is_some());
    }

    // Tests context leaves errors without a sample slot untouched
    // Verified by converting every error into a shape error
    #[test]
    fn test_context_on_other_errors() {
        let result: Result<(), CrbmError> = Err(empty_data_set("train"));
        assert!(matches!(
            result.with_sample(1),
            Err(CrbmError::EmptyDataSet { operation: "train" })
        ));
    }

    // Tests IO errors convert into file system errors
    // Verified by dropping the conversion
    #[test]
    fn test_from_io_error() {
        let error: CrbmError = std::io::Error::other("boom").into();
        assert!(matches!(error, CrbmError::FileSystem { .. }));
    }
}

//! Error types and context management for training and evaluation

use std::fmt;
use std::path::PathBuf;

/// Main error type for all CRBM operations
#[derive(Debug)]
pub enum CrbmError {
    /// Grid, kernel or stack dimensions are incompatible
    ///
    /// Occurs when:
    /// - A grid or kernel is not square
    /// - A kernel is larger than the data it is correlated with
    /// - Channel counts of data and kernel stacks differ
    ShapeMismatch {
        /// Operation that rejected the input
        operation: &'static str,
        /// Shape the operation required
        expected: String,
        /// Shape that was supplied
        actual: String,
        /// Index of the sample being processed, when known
        sample: Option<usize>,
    },

    /// Training or clustering was invoked without any samples
    EmptyDataSet {
        /// Operation that required data
        operation: &'static str,
    },

    /// A cluster without members was asked for its center
    DegenerateCluster {
        /// Position of the cluster in its collection
        index: usize,
    },

    /// Configuration parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Failed to load a sample image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save an exported feature map to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for CrbmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                operation,
                expected,
                actual,
                sample,
            } => {
                write!(
                    f,
                    "Shape mismatch in {operation}: expected {expected}, got {actual}"
                )?;
                if let Some(index) = sample {
                    write!(f, " (sample {index})")?;
                }
                Ok(())
            }
            Self::EmptyDataSet { operation } => {
                write!(f, "Empty data set passed to {operation}")
            }
            Self::DegenerateCluster { index } => {
                write!(f, "Cluster {index} has no members and no center")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for CrbmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for CRBM results
pub type Result<T> = std::result::Result<T, CrbmError>;

/// Additional context to enrich error messages
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorContext {
    /// Index of the sample being processed
    pub sample: Option<usize>,
}

/// Enriches error messages with training state information
pub trait WithContext<T> {
    /// Add error context to a Result
    ///
    /// # Errors
    ///
    /// Propagates the original error with additional context applied
    fn with_context(self, context: ErrorContext) -> Result<T>;

    /// Add just the sample index
    ///
    /// # Errors
    ///
    /// Propagates the original error with the sample index applied
    fn with_sample(self, sample: usize) -> Result<T>;
}

impl<T, E> WithContext<T> for std::result::Result<T, E>
where
    E: Into<CrbmError>,
{
    fn with_context(self, context: ErrorContext) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();
            // Only shape errors carry a sample slot
            if let CrbmError::ShapeMismatch { sample, .. } = &mut error {
                if sample.is_none() {
                    *sample = context.sample;
                }
            }
            error
        })
    }

    fn with_sample(self, sample: usize) -> Result<T> {
        self.with_context(ErrorContext {
            sample: Some(sample),
        })
    }
}

impl From<std::io::Error> for CrbmError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> CrbmError {
    CrbmError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a shape mismatch error without sample context
pub fn shape_mismatch(
    operation: &'static str,
    expected: &impl ToString,
    actual: &impl ToString,
) -> CrbmError {
    CrbmError::ShapeMismatch {
        operation,
        expected: expected.to_string(),
        actual: actual.to_string(),
        sample: None,
    }
}

/// Create an empty data set error
pub const fn empty_data_set(operation: &'static str) -> CrbmError {
    CrbmError::EmptyDataSet { operation }
}

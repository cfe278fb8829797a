//! Labeled sample loading from image directories

use crate::io::configuration::{
    BINARIZE_THRESHOLD, DEFAULT_EDGE_LENGTH, DEFAULT_MAX_DATA, DEFAULT_MIN_DATA, DEFAULT_PADDING,
    LABEL_SEPARATOR, SAMPLE_EXTENSIONS,
};
use crate::io::error::{CrbmError, Result, invalid_parameter};
use image::DynamicImage;
use image::imageops::FilterType;
use ndarray::{Array2, s};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Square grey-level sample with the label taken from its file name
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    /// Class label
    pub label: String,
    /// Pixel values, padded to the working side length
    pub data: Array2<f32>,
    /// File the sample was read from
    pub path: PathBuf,
}

/// How images are turned into samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleFormat {
    /// Side length images are resampled to
    pub edge_length: usize,
    /// Zero border added on every side
    pub padding: usize,
    /// Threshold grey levels to 0 or 1
    pub binarize: bool,
    /// Map dark ink to high values
    pub invert: bool,
    /// Value of a blank pixel
    pub min_data: f32,
    /// Value of a fully inked pixel
    pub max_data: f32,
}

impl Default for SampleFormat {
    fn default() -> Self {
        Self {
            edge_length: DEFAULT_EDGE_LENGTH,
            padding: DEFAULT_PADDING,
            binarize: false,
            invert: true,
            min_data: DEFAULT_MIN_DATA,
            max_data: DEFAULT_MAX_DATA,
        }
    }
}

impl SampleFormat {
    /// Side length of a prepared sample
    pub const fn padded_edge_length(&self) -> usize {
        self.edge_length + 2 * self.padding
    }

    fn validate(&self) -> Result<()> {
        if self.edge_length == 0 {
            return Err(invalid_parameter(
                "edge_length",
                &self.edge_length,
                &"must be positive",
            ));
        }
        if !(self.min_data.is_finite() && self.max_data.is_finite()) {
            return Err(invalid_parameter(
                "data range",
                &format!("[{}, {}]", self.min_data, self.max_data),
                &"bounds must be finite",
            ));
        }
        Ok(())
    }

    /// Convert a decoded image into a padded sample grid
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the format is invalid
    pub fn prepare(&self, image: &DynamicImage) -> Result<Array2<f32>> {
        self.validate()?;

        let edge = self.edge_length as u32;
        let grey = image
            .resize_exact(edge, edge, FilterType::Nearest)
            .to_luma32f();

        let padded = self.padded_edge_length();
        let mut data = Array2::<f32>::zeros((padded, padded));
        let mut interior = data.slice_mut(s![
            self.padding..self.padding + self.edge_length,
            self.padding..self.padding + self.edge_length
        ]);

        for (x, y, pixel) in grey.enumerate_pixels() {
            let mut value = pixel.0.first().copied().unwrap_or(0.0);
            if self.binarize {
                value = if value > BINARIZE_THRESHOLD { 1.0 } else { 0.0 };
            }
            if self.invert {
                value = 1.0 - value;
            }
            if let Some(cell) = interior.get_mut((y as usize, x as usize)) {
                *cell = self.min_data + value * (self.max_data - self.min_data);
            }
        }

        Ok(data)
    }
}

/// Label encoded in a sample's file name, the part before the first `_`
pub fn label_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    name.split(LABEL_SEPARATOR)
        .next()
        .unwrap_or_default()
        .to_string()
}

fn is_sample_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                SAMPLE_EXTENSIONS
                    .iter()
                    .any(|accepted| extension.eq_ignore_ascii_case(accepted))
            })
}

/// Load one image file as a labeled sample
///
/// # Errors
///
/// Returns `ImageLoad` if the image cannot be decoded, or `InvalidParameter`
/// if the format is invalid
pub fn load_sample(path: &Path, format: &SampleFormat) -> Result<LabeledSample> {
    let image = image::open(path).map_err(|e| CrbmError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(LabeledSample {
        label: label_from_path(path),
        data: format.prepare(&image)?,
        path: path.to_path_buf(),
    })
}

/// Load every png, jpg and gif file of a directory, sorted by file name
///
/// # Errors
///
/// Returns `FileSystem` if the directory cannot be read, `ImageLoad` for an
/// undecodable image, or `EmptyDataSet` if no sample files are found
pub fn load_directory(directory: &Path, format: &SampleFormat) -> Result<Vec<LabeledSample>> {
    let entries = std::fs::read_dir(directory).map_err(|e| CrbmError::FileSystem {
        path: directory.to_path_buf(),
        operation: "read directory",
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| CrbmError::FileSystem {
                path: directory.to_path_buf(),
                operation: "read directory entry",
                source: e,
            })?
            .path();
        if is_sample_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(CrbmError::EmptyDataSet {
            operation: "load_directory",
        });
    }

    let samples = paths
        .iter()
        .map(|path| {
            debug!(path = %path.display(), "Loading sample");
            load_sample(path, format)
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        directory = %directory.display(),
        samples = samples.len(),
        edge = format.padded_edge_length(),
        "Loaded samples"
    );
    Ok(samples)
}

/// Split samples into grids and labels
pub fn into_parts(samples: Vec<LabeledSample>) -> (Vec<Array2<f32>>, Vec<String>) {
    samples
        .into_iter()
        .map(|sample| (sample.data, sample.label))
        .unzip()
}

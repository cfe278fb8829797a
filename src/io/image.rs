//! PNG export of feature maps with min-max grey scaling

use crate::io::error::{CrbmError, Result};
use image::{GrayImage, Luma};
use ndarray::{ArrayView2, ArrayView3, Axis};
use std::path::{Path, PathBuf};

// Maps a grid onto 0..=255; a constant grid becomes black
fn to_grey_image(map: &ArrayView2<'_, f32>) -> GrayImage {
    let (min, max) = map
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &value| {
            (lo.min(value), hi.max(value))
        });
    let range = max - min;

    let (rows, cols) = map.dim();
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let value = map.get((y as usize, x as usize)).copied().unwrap_or(min);
        let scaled = if range > 0.0 {
            (value - min) / range * 255.0
        } else {
            0.0
        };
        Luma([scaled.round().clamp(0.0, 255.0) as u8])
    })
}

/// Export a single map as a grey-level PNG
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be saved to the specified path
pub fn export_map_as_png(map: &ArrayView2<'_, f32>, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CrbmError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    to_grey_image(map)
        .save(output_path)
        .map_err(|e| CrbmError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })
}

/// Export every channel of a stack as `<directory>/<sample>_<channel>.png`
///
/// Returns the written paths in channel order.
///
/// # Errors
///
/// Returns an error if any channel cannot be written
pub fn export_stack_as_png(
    stack: &ArrayView3<'_, f32>,
    directory: &Path,
    sample: usize,
) -> Result<Vec<PathBuf>> {
    stack
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(channel, map)| {
            let path = directory.join(format!("{sample}_{channel}.png"));
            export_map_as_png(&map, &path).map(|()| path)
        })
        .collect()
}

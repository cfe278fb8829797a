//! Per-layer epoch progress for stacked training

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use crate::model::crbm::EpochReport;
use crate::model::pipeline::TrainingMonitor;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::LazyLock;

/// One progress bar per layer, each advancing by epoch
pub struct ProgressManager {
    multi_progress: MultiProgress,
    layer_bars: Vec<ProgressBar>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{prefix}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

impl ProgressManager {
    /// Create a progress manager without bars
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            layer_bars: Vec::new(),
        }
    }

    /// Create one idle bar per training stage
    pub fn initialize(&mut self, layer_count: usize) {
        self.layer_bars.clear();
        for layer in 0..layer_count {
            let bar = ProgressBar::new(0);
            bar.set_style(PROGRESS_STYLE.clone());
            bar.set_prefix(format!("Layer {layer}"));
            self.layer_bars.push(self.multi_progress.add(bar));
        }
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        let _ = self.multi_progress.clear();
    }
}

impl TrainingMonitor for ProgressManager {
    fn layer_started(&mut self, layer: usize, max_epochs: usize) {
        if let Some(bar) = self.layer_bars.get(layer) {
            bar.set_length(max_epochs as u64);
            bar.set_position(0);
            bar.set_message("training");
        }
    }

    fn epoch_finished(&mut self, layer: usize, report: EpochReport) {
        if let Some(bar) = self.layer_bars.get(layer) {
            bar.set_position(report.epoch as u64);
            bar.set_message(format!("error {:.4}", report.error));
        }
    }

    fn layer_finished(&mut self, layer: usize, error: f32) {
        if let Some(bar) = self.layer_bars.get(layer) {
            bar.finish_with_message(format!("✓ error {error:.4}"));
        }
    }
}

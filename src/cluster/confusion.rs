//! Confusion matrix keyed by label pairs

use ndarray::Array2;

/// Counts of (actual, predicted) label pairs over a fixed set of classes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    classes: Vec<String>,
    table: Array2<usize>,
}

impl ConfusionMatrix {
    /// Empty matrix over the given classes, in the given order
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        let count = classes.len();
        Self {
            classes,
            table: Array2::zeros((count, count)),
        }
    }

    fn position(&self, class: &str) -> Option<usize> {
        self.classes.iter().position(|candidate| candidate == class)
    }

    /// Record one decision; pairs involving unknown classes are ignored
    pub fn add_entry(&mut self, actual: &str, predicted: &str) {
        if let (Some(row), Some(col)) = (self.position(actual), self.position(predicted)) {
            if let Some(cell) = self.table.get_mut((row, col)) {
                *cell += 1;
            }
        }
    }

    /// Count for a label pair, zero for unknown classes
    pub fn count(&self, actual: &str, predicted: &str) -> usize {
        self.position(actual)
            .zip(self.position(predicted))
            .and_then(|(row, col)| self.table.get((row, col)).copied())
            .unwrap_or(0)
    }

    /// Classes indexing rows (actual) and columns (predicted)
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Raw counts, rows actual and columns predicted
    pub const fn table(&self) -> &Array2<usize> {
        &self.table
    }

    /// Number of recorded decisions
    pub fn total(&self) -> usize {
        self.table.sum()
    }

    /// Fraction of recorded decisions on the diagonal
    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.table.diag().sum() as f32 / total as f32
    }
}

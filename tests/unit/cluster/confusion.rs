//! Tests for the label-pair confusion matrix

#[cfg(test)]
mod tests {
    use crbm::cluster::confusion::ConfusionMatrix;

    // Tests entries are counted per (actual, predicted) pair
    // Verified by transposing rows and columns
    #[test]
    fn test_counts() {
        let mut matrix = ConfusionMatrix::new(["a", "b"]);
        matrix.add_entry("a", "a");
        matrix.add_entry("a", "b");
        matrix.add_entry("a", "b");
        matrix.add_entry("b", "b");

        assert_eq!(matrix.count("a", "b"), 2);
        assert_eq!(matrix.count("b", "a"), 0);
        assert_eq!(matrix.total(), 4);
        assert!((matrix.accuracy() - 0.5).abs() < 1e-6);
        assert_eq!(matrix.table()[[0, 1]], 2);
    }

    // Tests unknown classes are ignored
    // Verified by growing the class list on demand
    #[test]
    fn test_unknown_classes_ignored() {
        let mut matrix = ConfusionMatrix::new(["a"]);
        matrix.add_entry("a", "z");
        matrix.add_entry("z", "a");
        assert_eq!(matrix.total(), 0);
        assert_eq!(matrix.count("z", "z"), 0);
        assert_eq!(matrix.classes(), &["a".to_string()]);
    }

    // Tests an empty matrix reports zero accuracy
    // Verified by dividing by the zero total
    #[test]
    fn test_empty_accuracy() {
        let matrix = ConfusionMatrix::new(Vec::<String>::new());
        assert!(matrix.accuracy().abs() < f32::EPSILON);
    }
}

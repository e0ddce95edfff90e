//! Post-processing shared by the vision nodes.

use crate::types::{Labeled, Scored};
use std::collections::BTreeMap;

/// Keep exactly the results scoring at least `threshold`, in their original
/// order. Returns how many were dropped.
///
/// NaN scores never pass.
pub fn retain_above_threshold<T: Scored>(results: &mut Vec<T>, threshold: f32) -> usize {
    let before = results.len();
    results.retain(|r| r.score() >= threshold);
    before - results.len()
}

/// Occurrence count per class label.
pub fn tally<T: Labeled>(results: &[T]) -> BTreeMap<String, usize> {
    let mut classes = BTreeMap::new();
    for result in results {
        *classes.entry(result.label()).or_insert(0) += 1;
    }
    classes
}

/// Index of the largest value; the first one wins on ties.
pub fn arg_max(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, v) in values.iter().copied().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if v <= best_score => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassPrediction, DetectedObject};

    struct S(f32);

    impl Scored for S {
        fn score(&self) -> f32 {
            self.0
        }
    }

    fn scores(results: &[S]) -> Vec<f32> {
        results.iter().map(|s| s.0).collect()
    }

    #[test]
    fn drops_adjacent_low_scores() {
        let mut results = vec![S(0.9), S(0.3), S(0.2), S(0.8)];
        let dropped = retain_above_threshold(&mut results, 0.5);
        assert_eq!(scores(&results), vec![0.9, 0.8]);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn drops_leading_and_trailing_runs() {
        let mut results = vec![S(0.1), S(0.2), S(0.7), S(0.4), S(0.3)];
        retain_above_threshold(&mut results, 0.5);
        assert_eq!(scores(&results), vec![0.7]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut results = vec![S(0.5), S(0.49999), S(0.6)];
        retain_above_threshold(&mut results, 0.5);
        assert_eq!(scores(&results), vec![0.5, 0.6]);
    }

    #[test]
    fn everything_or_nothing() {
        let mut results = vec![S(0.1), S(0.2)];
        assert_eq!(retain_above_threshold(&mut results, 0.5), 2);
        assert!(results.is_empty());

        let mut results = vec![S(0.6), S(0.7)];
        assert_eq!(retain_above_threshold(&mut results, 0.0), 0);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn nan_scores_are_dropped() {
        let mut results = vec![S(f32::NAN), S(0.9)];
        retain_above_threshold(&mut results, 0.0);
        assert_eq!(scores(&results), vec![0.9]);
    }

    #[test]
    fn tally_counts_detections_per_class() {
        let detections = vec![
            DetectedObject::new("cat", 0.9, [0.0; 4]),
            DetectedObject::new("dog", 0.8, [0.0; 4]),
            DetectedObject::new("cat", 0.7, [0.0; 4]),
        ];
        let classes = tally(&detections);
        assert_eq!(classes.len(), 2);
        assert_eq!(classes["cat"], 2);
        assert_eq!(classes["dog"], 1);
    }

    #[test]
    fn tally_falls_back_to_class_index() {
        let predictions = vec![
            ClassPrediction::with_label(3, 0.9, "tabby"),
            ClassPrediction::new(7, 0.4),
        ];
        let classes = tally(&predictions);
        assert_eq!(classes["tabby"], 1);
        assert_eq!(classes["7"], 1);
    }

    #[test]
    fn tally_of_nothing_is_empty() {
        let empty: Vec<DetectedObject> = vec![];
        assert!(tally(&empty).is_empty());
    }

    #[test]
    fn arg_max_of_fixed_vector() {
        assert_eq!(arg_max(&[0.1, 0.7, 0.2]), Some(1));
    }

    #[test]
    fn arg_max_edge_cases() {
        assert_eq!(arg_max(&[]), None);
        assert_eq!(arg_max(&[f32::NAN, f32::NAN]), None);
        assert_eq!(arg_max(&[0.4, 0.9, 0.9]), Some(1));
        assert_eq!(arg_max(&[f32::NAN, -3.0, -1.0]), Some(2));
    }
}

//! ROC curve and AUC for a score against a binary label
//!
//! One point per distinct score, highest first, starting at (0, 0) with an
//! infinite threshold. Ties move both rates in a single step.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
    /// Score at or above which a sample counts as positive
    pub threshold: f64,
}

/// Build the curve. Empty when the label has a single class or the inputs
/// differ in length.
pub fn roc_curve(labels: &[bool], scores: &[f64]) -> Vec<RocPoint> {
    if labels.len() != scores.len() {
        return Vec::new();
    }

    let positives = labels.iter().filter(|l| **l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = vec![RocPoint { fpr: 0.0, tpr: 0.0, threshold: f64::INFINITY }];
    let (mut tp, mut fp) = (0usize, 0usize);

    let mut i = 0;
    while i < order.len() {
        let score = scores[order[i]];
        while i < order.len() && scores[order[i]] == score {
            if labels[order[i]] {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            fpr: fp as f64 / negatives as f64,
            tpr: tp as f64 / positives as f64,
            threshold: score,
        });
    }

    points
}

/// Trapezoidal area under the curve; `None` for an empty curve
pub fn auc(points: &[RocPoint]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    Some(
        points
            .windows(2)
            .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
            .sum(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_separation() {
        let labels = [false, false, true, true];
        let scores = [0.1, 0.2, 0.8, 0.9];
        let curve = roc_curve(&labels, &scores);

        assert_eq!(curve.first().unwrap().fpr, 0.0);
        assert_eq!(curve.last().unwrap().tpr, 1.0);
        assert_eq!(auc(&curve), Some(1.0));
    }

    #[test]
    fn test_inverted_ranking() {
        let labels = [true, true, false, false];
        let scores = [0.1, 0.2, 0.8, 0.9];
        assert_eq!(auc(&roc_curve(&labels, &scores)), Some(0.0));
    }

    #[test]
    fn test_ties_are_one_step() {
        let labels = [true, false, true, false];
        let scores = [0.5, 0.5, 0.5, 0.5];
        let curve = roc_curve(&labels, &scores);

        assert_eq!(curve.len(), 2);
        assert_eq!(auc(&curve), Some(0.5));
    }

    #[test]
    fn test_known_auc() {
        // sklearn: roc_auc_score([0,0,1,1], [0.1,0.4,0.35,0.8]) == 0.75
        let labels = [false, false, true, true];
        let scores = [0.1, 0.4, 0.35, 0.8];
        let value = auc(&roc_curve(&labels, &scores)).unwrap();
        assert!((value - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_undefined() {
        assert!(roc_curve(&[false, false], &[0.1, 0.2]).is_empty());
        assert!(roc_curve(&[true], &[0.1]).is_empty());
        assert_eq!(auc(&[]), None);
    }
}

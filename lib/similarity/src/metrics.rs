//! Alternative similarity metrics
//!
//! Scoring primitives that can stand in for, or blend with, the cosine
//! blend. All of them return a similarity where higher means closer, and
//! none of them fail on missing input.

use ahash::AHashSet;
use std::hash::Hash;

use crate::config::IntervalMetric;

/// Jaccard index of two sets.
///
/// Two empty sets agree vacuously and score 1.0.
pub fn jaccard<T, A, B>(a: A, b: B) -> f64
where
    T: Eq + Hash,
    A: IntoIterator<Item = T>,
    B: IntoIterator<Item = T>,
{
    let set_a: AHashSet<T> = a.into_iter().collect();
    let set_b: AHashSet<T> = b.into_iter().collect();

    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

/// Overlap over union of two numeric intervals.
///
/// Zero when any bound is missing or the union is empty.
pub fn interval_iou(min1: Option<f64>, max1: Option<f64>, min2: Option<f64>, max2: Option<f64>) -> f64 {
    let (Some(min1), Some(max1), Some(min2), Some(max2)) = (min1, max1, min2, max2) else {
        return 0.0;
    };

    let overlap = (max1.min(max2) - min1.max(min2)).max(0.0);
    let union = max1.max(max2) - min1.min(min2);
    if union > 0.0 {
        overlap / union
    } else {
        0.0
    }
}

/// [`interval_iou`], falling back to `1 / (1 + |mid1 - mid2|)` when the
/// overlap score is exactly zero.
///
/// Disjoint ranges then still rank by how far apart they sit.
pub fn interval_iou_with_decay(min1: Option<f64>, max1: Option<f64>, min2: Option<f64>, max2: Option<f64>) -> f64 {
    let iou = interval_iou(min1, max1, min2, max2);
    if iou != 0.0 {
        return iou;
    }

    match (min1, max1, min2, max2) {
        (Some(min1), Some(max1), Some(min2), Some(max2)) => {
            let mid1 = (min1 + max1) / 2.0;
            let mid2 = (min2 + max2) / 2.0;
            1.0 / (1.0 + (mid1 - mid2).abs())
        }
        _ => 0.0,
    }
}

/// Interval similarity under the configured metric
pub fn interval_similarity(
    metric: IntervalMetric,
    min1: Option<f64>,
    max1: Option<f64>,
    min2: Option<f64>,
    max2: Option<f64>,
) -> f64 {
    match metric {
        IntervalMetric::Overlap => interval_iou(min1, max1, min2, max2),
        IntervalMetric::OverlapWithDecay => interval_iou_with_decay(min1, max1, min2, max2),
    }
}

/// Share of fields whose values are equal.
///
/// Each field is a singleton-set Jaccard: 1 on a match, 0 otherwise. A
/// missing value on either side is a mismatch. An empty field list scores 0.
pub fn categorical_match_ratio<'a, I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
{
    let mut fields = 0usize;
    let mut matches = 0usize;
    for (a, b) in pairs {
        fields += 1;
        if let (Some(a), Some(b)) = (a, b) {
            if a == b {
                matches += 1;
            }
        }
    }

    if fields == 0 {
        0.0
    } else {
        matches as f64 / fields as f64
    }
}

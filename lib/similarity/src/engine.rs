//! Similarity engine
//!
//! Scores every record of a feature table against every other record and
//! keeps the top-N neighbors per record. The pairwise work is quadratic in
//! the record count.
//!
//! Ablation runs and alternative metrics are configurations of the same
//! engine: the active family set and the [`MetricStrategy`] pick what gets
//! computed.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use steelmatch_core::{min_max_scale, RecordId, SimilarityMatrix, Vector};
use tracing::debug;

use crate::config::{ConfigError, EngineConfig, FeatureFamily, MetricStrategy};
use crate::features::{FeatureTable, DIMENSION_BOUNDS, DIMENSION_COLUMNS};
use crate::metrics::{categorical_match_ratio, interval_similarity};

/// One ranked neighbor of a query record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub rfq_id: RecordId,
    pub match_id: RecordId,
    pub similarity_score: f64,
}

/// Mean score over a result table
pub fn mean_score(results: &[MatchResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    Some(results.iter().map(|r| r.similarity_score).sum::<f64>() / results.len() as f64)
}

/// Round a score to `precision` decimal places
pub fn round_score(score: f64, precision: Option<u32>) -> f64 {
    match precision {
        Some(digits) => {
            let factor = 10f64.powi(digits as i32);
            (score * factor).round() / factor
        }
        None => score,
    }
}

/// A way of turning a feature table into a pairwise similarity matrix
pub trait SimilarityStrategy {
    fn name(&self) -> &'static str;

    /// Aggregate similarity for every pair; the diagonal is not yet cleared
    fn similarity(&self, features: &FeatureTable, config: &EngineConfig) -> SimilarityMatrix;
}

/// Min-max scaled numeric block; missing cells count as zero before scaling
pub(crate) fn scaled_numeric_rows<S: AsRef<str>>(features: &FeatureTable, columns: &[S]) -> Vec<Vector> {
    let mut rows: Vec<Vector> = (0..features.len())
        .map(|row| {
            Vector::new(
                columns
                    .iter()
                    .map(|c| features.number(row, c.as_ref()).unwrap_or(0.0))
                    .collect(),
            )
        })
        .collect();
    min_max_scale(&mut rows);
    rows
}

/// One-hot encoding of categorical columns.
///
/// Each column gets one slot per distinct value, in first-seen order, plus a
/// slot for missing cells.
pub fn one_hot_rows<S: AsRef<str>>(features: &FeatureTable, columns: &[S]) -> Vec<Vector> {
    let table = features.table();
    let mut blocks: Vec<Vec<Vector>> = Vec::with_capacity(columns.len());

    for column in columns {
        let column = column.as_ref();
        let mut slots: AHashMap<String, usize> = AHashMap::new();
        let cells: Vec<Option<String>> = table
            .column_values(column)
            .map(|v| match v {
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
                None => None,
            })
            .collect();
        for cell in cells.iter().flatten() {
            let next = slots.len();
            slots.entry(cell.clone()).or_insert(next);
        }

        let missing_slot = slots.len();
        let width = slots.len() + 1;
        let block = cells
            .iter()
            .map(|cell| {
                let mut v = Vector::zeros(width);
                let slot = cell
                    .as_ref()
                    .and_then(|c| slots.get(c))
                    .copied()
                    .unwrap_or(missing_slot);
                v.as_mut_slice()[slot] = 1.0;
                v
            })
            .collect();
        blocks.push(block);
    }

    (0..features.len())
        .map(|row| {
            let mut v = Vector::default();
            for block in &blocks {
                v.extend(&block[row]);
            }
            v
        })
        .collect()
}

/// Cosine over the scaled dimension bounds
pub fn dimensional_similarity(features: &FeatureTable) -> SimilarityMatrix {
    SimilarityMatrix::cosine(&scaled_numeric_rows(features, &DIMENSION_COLUMNS))
}

/// Cosine over the scaled property midpoints
pub fn grade_similarity(features: &FeatureTable) -> SimilarityMatrix {
    SimilarityMatrix::cosine(&scaled_numeric_rows(features, features.mid_columns().as_slice()))
}

/// Cosine over one-hot categorical rows
pub fn categorical_similarity(features: &FeatureTable) -> SimilarityMatrix {
    SimilarityMatrix::cosine(&one_hot_rows(features, features.categorical_columns()))
}

/// Per-family cosine matrices blended by weight
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineBlend;

impl CosineBlend {
    /// Similarity matrix of one family; all zeros when the family is inactive
    pub fn family_matrix(
        &self,
        features: &FeatureTable,
        config: &EngineConfig,
        family: FeatureFamily,
    ) -> SimilarityMatrix {
        if !config.is_active(family) {
            return SimilarityMatrix::zeros(features.len());
        }
        debug!(family = %family, records = features.len(), "computing family similarity");
        match family {
            FeatureFamily::Dimensional => dimensional_similarity(features),
            FeatureFamily::GradeProperties => grade_similarity(features),
            FeatureFamily::Categorical => categorical_similarity(features),
        }
    }
}

impl SimilarityStrategy for CosineBlend {
    fn name(&self) -> &'static str {
        "cosine_blend"
    }

    fn similarity(&self, features: &FeatureTable, config: &EngineConfig) -> SimilarityMatrix {
        let mut aggregate = SimilarityMatrix::zeros(features.len());
        for family in FeatureFamily::ALL {
            if config.is_active(family) {
                let matrix = self.family_matrix(features, config, family);
                aggregate.add_scaled(&matrix, config.weight(family));
            }
        }
        aggregate
    }
}

/// Weighted blend of mean dimension interval similarity, grade cosine and
/// categorical match ratio
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridSimilarity;

impl HybridSimilarity {
    /// Mean interval similarity over the three dimensions
    pub fn dimension_score(&self, features: &FeatureTable, config: &EngineConfig, i: usize, j: usize) -> f64 {
        let total: f64 = DIMENSION_BOUNDS
            .iter()
            .map(|bounds| {
                let (min1, max1) = features.interval(i, *bounds);
                let (min2, max2) = features.interval(j, *bounds);
                interval_similarity(config.interval_metric, min1, max1, min2, max2)
            })
            .sum();
        total / DIMENSION_BOUNDS.len() as f64
    }

    /// Match ratio over the configured fields present in the table
    pub fn categorical_score(&self, features: &FeatureTable, config: &EngineConfig, i: usize, j: usize) -> f64 {
        categorical_match_ratio(
            config
                .hybrid_categorical_columns
                .iter()
                .filter(|c| features.categorical_columns().contains(*c))
                .map(|c| (features.category(i, c), features.category(j, c))),
        )
    }
}

impl SimilarityStrategy for HybridSimilarity {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn similarity(&self, features: &FeatureTable, config: &EngineConfig) -> SimilarityMatrix {
        let n = features.len();
        let dim_weight = config.weight(FeatureFamily::Dimensional);
        let grade_weight = config.weight(FeatureFamily::GradeProperties);
        let cat_weight = config.weight(FeatureFamily::Categorical);

        let grade = if config.is_active(FeatureFamily::GradeProperties) {
            grade_similarity(features)
        } else {
            SimilarityMatrix::zeros(n)
        };

        SimilarityMatrix::from_fn(n, |i, j| {
            let mut score = grade_weight * grade.get(i, j);
            if dim_weight != 0.0 {
                score += dim_weight * self.dimension_score(features, config, i, j);
            }
            if cat_weight != 0.0 {
                score += cat_weight * self.categorical_score(features, config, i, j);
            }
            score
        })
    }
}

/// Top-N neighbor ranking over one feature table
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    config: EngineConfig,
}

impl SimilarityEngine {
    /// Create an engine; the config is validated up front
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn strategy(&self) -> &'static dyn SimilarityStrategy {
        match self.config.strategy {
            MetricStrategy::CosineBlend => &CosineBlend,
            MetricStrategy::Hybrid => &HybridSimilarity,
        }
    }

    /// Aggregate matrix with self-similarity cleared
    pub fn similarity_matrix(&self, features: &FeatureTable) -> SimilarityMatrix {
        let strategy = self.strategy();
        debug!(strategy = strategy.name(), records = features.len(), "building similarity matrix");
        let mut matrix = strategy.similarity(features, &self.config);
        matrix.zero_diagonal();
        matrix
    }

    /// Rank every record's neighbors.
    ///
    /// Emits `min(top_n, n - 1)` results per record, grouped by record in
    /// table order, scores descending, ties in table order.
    pub fn rank(&self, features: &FeatureTable) -> Vec<MatchResult> {
        let matrix = self.similarity_matrix(features);
        extract_top_k(&features.ids(), &matrix, self.config.top_n, self.config.score_precision)
    }
}

/// Per-row top-k extraction shared by every strategy
pub fn extract_top_k(
    ids: &[RecordId],
    matrix: &SimilarityMatrix,
    top_n: usize,
    precision: Option<u32>,
) -> Vec<MatchResult> {
    let mut results = Vec::with_capacity(ids.len() * top_n.min(ids.len().saturating_sub(1)));
    for (i, rfq_id) in ids.iter().enumerate() {
        for (j, score) in matrix.top_k(i, top_n) {
            results.push(MatchResult {
                rfq_id: rfq_id.clone(),
                match_id: ids[j].clone(),
                similarity_score: round_score(score, precision),
            });
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureEngineer;
    use steelmatch_core::{Record, Table};

    fn rfq(id: u64, thickness: (f64, f64), width: f64, carbon: &str, finish: &str, coating: Option<&str>) -> Record {
        Record::new(id)
            .with_field("thickness_min", thickness.0)
            .with_field("thickness_max", thickness.1)
            .with_field("width_min", width)
            .with_field("width_max", width)
            .with_field("Carbon (C)", carbon)
            .with_field("finish", finish)
            .with_field("coating", coating)
    }

    fn features() -> FeatureTable {
        let table = Table::from_records(vec![
            rfq(1, (2.0, 3.0), 1250.0, "0.17", "hot rolled", Some("none")),
            rfq(2, (2.0, 3.0), 1250.0, "0.17", "hot rolled", Some("none")),
            rfq(3, (0.5, 0.8), 1000.0, "0.05-0.08", "cold rolled", Some("zinc")),
            rfq(4, (0.5, 0.7), 1000.0, "0.06", "cold rolled", None),
            rfq(5, (8.0, 10.0), 2000.0, "0.20-0.22", "hot rolled", Some("none")),
        ])
        .unwrap();
        FeatureEngineer::default().engineer(&table)
    }

    #[test]
    fn test_result_count_and_self_exclusion() {
        let features = features();
        let engine = SimilarityEngine::new(EngineConfig::default()).unwrap();
        let results = engine.rank(&features);

        assert_eq!(results.len(), 5 * 3);
        for r in &results {
            assert_ne!(r.rfq_id, r.match_id);
        }
    }

    #[test]
    fn test_result_count_small_table() {
        let table = Table::from_records(vec![rfq(1, (1.0, 2.0), 100.0, "0.1", "a", None), rfq(2, (1.0, 2.0), 100.0, "0.1", "a", None)]).unwrap();
        let features = FeatureEngineer::default().engineer(&table);
        let engine = SimilarityEngine::new(EngineConfig::default().with_top_n(5)).unwrap();
        let results = engine.rank(&features);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].match_id, RecordId::Integer(2));
        assert_eq!(results[1].match_id, RecordId::Integer(1));
    }

    #[test]
    fn test_identical_records_rank_first() {
        let features = features();
        let engine = SimilarityEngine::new(EngineConfig::default()).unwrap();
        let results = engine.rank(&features);

        assert_eq!(results[0].rfq_id, RecordId::Integer(1));
        assert_eq!(results[0].match_id, RecordId::Integer(2));
        assert!((results[0].similarity_score - 1.0).abs() < 1e-9);
        assert_eq!(results[3].rfq_id, RecordId::Integer(2));
        assert_eq!(results[3].match_id, RecordId::Integer(1));
    }

    #[test]
    fn test_scores_descend_per_query() {
        let features = features();
        for strategy in [MetricStrategy::CosineBlend, MetricStrategy::Hybrid] {
            let engine = SimilarityEngine::new(EngineConfig::default().with_strategy(strategy)).unwrap();
            let results = engine.rank(&features);
            for chunk in results.chunks(3) {
                assert!(chunk.windows(2).all(|w| w[0].similarity_score >= w[1].similarity_score));
                assert!(chunk.iter().all(|r| r.rfq_id == chunk[0].rfq_id));
            }
        }
    }

    #[test]
    fn test_inactive_families_contribute_nothing() {
        let features = features();
        let config = EngineConfig::only(FeatureFamily::Categorical);
        let matrix = CosineBlend.similarity(&features, &config);
        let categorical = categorical_similarity(&features);

        assert_eq!(matrix, categorical);
        let dims = CosineBlend.family_matrix(&features, &config, FeatureFamily::Dimensional);
        assert_eq!(dims, SimilarityMatrix::zeros(5));
    }

    #[test]
    fn test_missing_family_columns_give_zero_matrix() {
        let table = Table::from_records(vec![
            Record::new(1u64).with_field("thickness_min", 1.0),
            Record::new(2u64).with_field("thickness_min", 2.0),
        ])
        .unwrap();
        let features = FeatureEngineer::default().engineer(&table);

        assert_eq!(grade_similarity(&features), SimilarityMatrix::zeros(2));
        assert_eq!(categorical_similarity(&features), SimilarityMatrix::zeros(2));

        let engine = SimilarityEngine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.rank(&features).len(), 2);
    }

    #[test]
    fn test_constant_columns_do_not_fail() {
        let table = Table::from_records(vec![
            rfq(1, (2.0, 2.0), 1000.0, "0.1", "x", None),
            rfq(2, (2.0, 2.0), 1000.0, "0.1", "x", None),
            rfq(3, (2.0, 2.0), 1000.0, "0.1", "x", None),
        ])
        .unwrap();
        let features = FeatureEngineer::default().engineer(&table);
        let matrix = dimensional_similarity(&features);
        assert_eq!(matrix, SimilarityMatrix::zeros(3));

        let results = SimilarityEngine::new(EngineConfig::default()).unwrap().rank(&features);
        // equal scores fall back to table order
        assert_eq!(results[0].match_id, RecordId::Integer(2));
        assert_eq!(results[1].match_id, RecordId::Integer(3));
    }

    #[test]
    fn test_one_hot_has_missing_slot() {
        let table = Table::from_records(vec![
            Record::new(1u64).with_field("tag", "a"),
            Record::new(2u64).with_field("tag", "b"),
            Record::new(3u64).with_field("tag", Value::Null),
        ])
        .unwrap();
        let features = FeatureEngineer::default().engineer(&table);
        let rows = one_hot_rows(&features, &["tag"]);

        assert_eq!(rows[0].as_slice(), &[1.0, 0.0, 0.0]);
        assert_eq!(rows[1].as_slice(), &[0.0, 1.0, 0.0]);
        assert_eq!(rows[2].as_slice(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_hybrid_scores_match_primitives() {
        let features = features();
        let config = EngineConfig::default().with_strategy(MetricStrategy::Hybrid);
        let matrix = HybridSimilarity.similarity(&features, &config);
        let grade = grade_similarity(&features);

        let expected = 0.4 * HybridSimilarity.dimension_score(&features, &config, 0, 2)
            + 0.3 * grade.get(0, 2)
            + 0.3 * HybridSimilarity.categorical_score(&features, &config, 0, 2);
        assert!((matrix.get(0, 2) - expected).abs() < 1e-12);

        // identical thickness and width; weight bounds are absent and score 0
        assert!((HybridSimilarity.dimension_score(&features, &config, 0, 1) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(HybridSimilarity.categorical_score(&features, &config, 0, 1), 1.0);
    }

    #[test]
    fn test_hybrid_categorical_uses_configured_fields() {
        let table = Table::from_records(vec![
            Record::new(1u64)
                .with_field("finish", "gi")
                .with_field("form", "coil")
                .with_field("surface_protection", "oiled"),
            Record::new(2u64)
                .with_field("finish", "gi")
                .with_field("form", "sheet")
                .with_field("surface_protection", "dry"),
        ])
        .unwrap();
        let features = FeatureEngineer::default().engineer(&table);
        let mut config = EngineConfig::default().with_strategy(MetricStrategy::Hybrid);

        // surface_protection is engineered but not compared
        assert!(features.categorical_columns().contains(&"surface_protection".to_string()));
        assert_eq!(HybridSimilarity.categorical_score(&features, &config, 0, 1), 0.5);

        config.hybrid_categorical_columns = vec!["finish".to_string()];
        assert_eq!(HybridSimilarity.categorical_score(&features, &config, 0, 1), 1.0);

        config.hybrid_categorical_columns = vec!["grade_class".to_string()];
        assert_eq!(HybridSimilarity.categorical_score(&features, &config, 0, 1), 0.0);
    }

    #[test]
    fn test_score_precision() {
        let features = features();
        let mut config = EngineConfig::default();
        config.score_precision = Some(3);
        let results = SimilarityEngine::new(config).unwrap().rank(&features);
        for r in results {
            assert_eq!(r.similarity_score, round_score(r.similarity_score, Some(3)));
        }
    }

    #[test]
    fn test_mean_score() {
        assert_eq!(mean_score(&[]), None);
        let results = vec![
            MatchResult { rfq_id: 1u64.into(), match_id: 2u64.into(), similarity_score: 0.5 },
            MatchResult { rfq_id: 1u64.into(), match_id: 3u64.into(), similarity_score: 1.0 },
        ];
        assert_eq!(mean_score(&results), Some(0.75));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(SimilarityEngine::new(EngineConfig::default().with_top_n(0)).is_err());
    }
}

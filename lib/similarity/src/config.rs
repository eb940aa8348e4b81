//! Engine configuration
//!
//! Weights, active feature families and the metric strategy for one ranking
//! run. Each ablation scenario owns its own [`EngineConfig`] so runs stay
//! independent of each other.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// A group of derived columns scored by one similarity metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFamily {
    /// Thickness, width and weight bounds
    Dimensional,
    /// Chemical and mechanical property midpoints from the reference table
    #[serde(alias = "grade")]
    GradeProperties,
    /// Coating, finish, form and surface attributes
    Categorical,
}

impl FeatureFamily {
    pub const ALL: [FeatureFamily; 3] = [
        FeatureFamily::Dimensional,
        FeatureFamily::GradeProperties,
        FeatureFamily::Categorical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureFamily::Dimensional => "dimensional",
            FeatureFamily::GradeProperties => "grade_properties",
            FeatureFamily::Categorical => "categorical",
        }
    }
}

impl std::fmt::Display for FeatureFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dimensional" | "dimensions" => Ok(FeatureFamily::Dimensional),
            "grade_properties" | "grade" => Ok(FeatureFamily::GradeProperties),
            "categorical" => Ok(FeatureFamily::Categorical),
            other => Err(ConfigError::UnknownFamily(other.to_string())),
        }
    }
}

/// How pairwise similarity is computed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MetricStrategy {
    /// Min-max scaled cosine per family, blended by weight
    #[default]
    CosineBlend,
    /// Interval overlap for dimensions, grade cosine, categorical match ratio
    Hybrid,
}

impl FromStr for MetricStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cosine" | "cosine_blend" | "baseline" => Ok(MetricStrategy::CosineBlend),
            "hybrid" => Ok(MetricStrategy::Hybrid),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Interval comparison used wherever ranges meet ranges
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntervalMetric {
    /// Plain intersection over union
    Overlap,
    /// Intersection over union, with `1 / (1 + |mid1 - mid2|)` when the
    /// intervals do not overlap.
    ///
    /// The fallback mixes a bounded ratio with an unscaled distance; treat
    /// it as a tunable.
    #[default]
    OverlapWithDecay,
}

/// Configuration of one ranking run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Matches emitted per record
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Per-family blend weights. They need not sum to 1.
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<FeatureFamily, f64>,

    /// Families that contribute; the rest score zero
    #[serde(default = "default_families")]
    pub active_families: BTreeSet<FeatureFamily>,

    #[serde(default)]
    pub strategy: MetricStrategy,

    #[serde(default)]
    pub interval_metric: IntervalMetric,

    /// Fields compared by the hybrid categorical match ratio
    #[serde(default = "default_hybrid_categorical_columns")]
    pub hybrid_categorical_columns: Vec<String>,

    /// Decimal places kept in emitted scores; full precision when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_precision: Option<u32>,
}

pub const DEFAULT_TOP_N: usize = 3;

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_weights() -> BTreeMap<FeatureFamily, f64> {
    BTreeMap::from([
        (FeatureFamily::Dimensional, 0.4),
        (FeatureFamily::GradeProperties, 0.3),
        (FeatureFamily::Categorical, 0.3),
    ])
}

fn default_hybrid_categorical_columns() -> Vec<String> {
    ["coating", "finish", "form", "surface_type"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_families() -> BTreeSet<FeatureFamily> {
    FeatureFamily::ALL.into_iter().collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            weights: default_weights(),
            active_families: default_families(),
            strategy: MetricStrategy::default(),
            interval_metric: IntervalMetric::default(),
            hybrid_categorical_columns: default_hybrid_categorical_columns(),
            score_precision: None,
        }
    }
}

impl EngineConfig {
    /// A config where only `family` contributes, at weight 1.0
    pub fn only(family: FeatureFamily) -> Self {
        Self {
            weights: BTreeMap::from([(family, 1.0)]),
            active_families: BTreeSet::from([family]),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_weights(mut self, dimensional: f64, grade_properties: f64, categorical: f64) -> Self {
        self.weights = BTreeMap::from([
            (FeatureFamily::Dimensional, dimensional),
            (FeatureFamily::GradeProperties, grade_properties),
            (FeatureFamily::Categorical, categorical),
        ]);
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: MetricStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    #[inline]
    pub fn is_active(&self, family: FeatureFamily) -> bool {
        self.active_families.contains(&family)
    }

    /// Blend weight of a family; zero when inactive or unset
    pub fn weight(&self, family: FeatureFamily) -> f64 {
        if !self.is_active(family) {
            return 0.0;
        }
        self.weights.get(&family).copied().unwrap_or(0.0)
    }

    /// Validate the config
    /// - At least one family is active
    /// - top_n is positive
    /// - Weights are finite and non-negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.active_families.is_empty() {
            return Err(ConfigError::NoActiveFamilies);
        }
        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        for (family, weight) in &self.weights {
            if !weight.is_finite() {
                return Err(ConfigError::NonFiniteWeight(*family));
            }
            if *weight < 0.0 {
                return Err(ConfigError::NegativeWeight(*family));
            }
        }
        Ok(())
    }

    /// Copy of this config with active weights rescaled to sum to 1.0
    pub fn normalized(&self) -> Result<Self, ConfigError> {
        self.validate()?;
        let total: f64 = FeatureFamily::ALL.iter().map(|f| self.weight(*f)).sum();
        if total <= 0.0 {
            return Err(ConfigError::ZeroTotalWeight);
        }

        let mut config = self.clone();
        for (family, weight) in config.weights.iter_mut() {
            if self.is_active(*family) {
                *weight /= total;
            }
        }
        Ok(config)
    }
}

/// Errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("At least one feature family must be active")]
    NoActiveFamilies,

    #[error("top_n must be at least 1")]
    ZeroTopN,

    #[error("Family '{0}' has negative weight")]
    NegativeWeight(FeatureFamily),

    #[error("Family '{0}' has a non-finite weight")]
    NonFiniteWeight(FeatureFamily),

    #[error("Total weight cannot be zero")]
    ZeroTotalWeight,

    #[error("Matcher weight {0} must be finite and non-negative")]
    InvalidMatcherWeight(f64),

    #[error("Unknown feature family '{0}'")]
    UnknownFamily(String),

    #[error("Unknown metric strategy '{0}'")]
    UnknownStrategy(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.weight(FeatureFamily::Dimensional), 0.4);
        assert_eq!(config.weight(FeatureFamily::GradeProperties), 0.3);
        assert_eq!(config.weight(FeatureFamily::Categorical), 0.3);
        assert_eq!(config.strategy, MetricStrategy::CosineBlend);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inactive_family_has_zero_weight() {
        let config = EngineConfig::only(FeatureFamily::GradeProperties);
        assert_eq!(config.weight(FeatureFamily::GradeProperties), 1.0);
        assert_eq!(config.weight(FeatureFamily::Dimensional), 0.0);
        assert!(!config.is_active(FeatureFamily::Categorical));
    }

    #[test]
    fn test_normalization() {
        let config = EngineConfig::default().with_weights(2.0, 1.0, 1.0);
        let normalized = config.normalized().unwrap();

        let sum: f64 = FeatureFamily::ALL.iter().map(|f| normalized.weight(*f)).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((normalized.weight(FeatureFamily::Dimensional) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_validation_errors() {
        let negative = EngineConfig::default().with_weights(-0.1, 0.5, 0.5);
        assert_eq!(
            negative.validate(),
            Err(ConfigError::NegativeWeight(FeatureFamily::Dimensional))
        );

        let mut empty = EngineConfig::default();
        empty.active_families.clear();
        assert_eq!(empty.validate(), Err(ConfigError::NoActiveFamilies));

        assert_eq!(
            EngineConfig::default().with_top_n(0).validate(),
            Err(ConfigError::ZeroTopN)
        );

        let zero = EngineConfig::default().with_weights(0.0, 0.0, 0.0);
        assert_eq!(zero.normalized(), Err(ConfigError::ZeroTotalWeight));
    }

    #[test]
    fn test_family_parsing() {
        assert_eq!("grade".parse::<FeatureFamily>(), Ok(FeatureFamily::GradeProperties));
        assert_eq!(" Dimensional ".parse::<FeatureFamily>(), Ok(FeatureFamily::Dimensional));
        assert!(matches!(
            "colour".parse::<FeatureFamily>(),
            Err(ConfigError::UnknownFamily(_))
        ));
    }

    #[test]
    fn test_serde_defaults_and_roundtrip() {
        let parsed: EngineConfig = serde_json::from_str(r#"{"strategy": "hybrid"}"#).unwrap();
        assert_eq!(parsed.strategy, MetricStrategy::Hybrid);
        assert_eq!(parsed.top_n, 3);
        assert_eq!(parsed.active_families.len(), 3);

        let json = serde_json::to_string(&EngineConfig::default()).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EngineConfig::default());
    }
}

//! Ablation and strategy comparison runs
//!
//! A scenario is a named [`EngineConfig`]. Running a list of scenarios over
//! one feature table gives the matches and the mean score of each.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ConfigError, EngineConfig, FeatureFamily, MetricStrategy};
use crate::engine::{mean_score, MatchResult, SimilarityEngine};
use crate::features::FeatureTable;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub config: EngineConfig,
}

impl Scenario {
    pub fn new(name: &str, config: EngineConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
        }
    }
}

/// All families, each family alone, and a dimension-heavy reweighting
pub fn ablation_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("all_features", EngineConfig::default()),
        Scenario::new("dimensions_only", EngineConfig::only(FeatureFamily::Dimensional)),
        Scenario::new("grade_only", EngineConfig::only(FeatureFamily::GradeProperties)),
        Scenario::new("categorical_only", EngineConfig::only(FeatureFamily::Categorical)),
        Scenario::new(
            "adjusted_weights",
            EngineConfig::default().with_weights(0.5, 0.2, 0.3),
        ),
    ]
}

/// Cosine blend against the hybrid metric, same weights
pub fn comparison_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("baseline", EngineConfig::default()),
        Scenario::new(
            "hybrid",
            EngineConfig::default().with_strategy(MetricStrategy::Hybrid),
        ),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub name: String,
    pub matches: Vec<MatchResult>,
    /// None when the scenario produced no matches
    pub mean_score: Option<f64>,
}

/// Run each scenario independently, in order
pub fn run_scenarios(features: &FeatureTable, scenarios: &[Scenario]) -> Result<Vec<ScenarioOutcome>, ConfigError> {
    scenarios
        .iter()
        .map(|scenario| {
            let engine = SimilarityEngine::new(scenario.config.clone())?;
            let matches = engine.rank(features);
            let mean_score = mean_score(&matches);
            match mean_score {
                Some(mean) => info!(scenario = %scenario.name, mean, "average similarity"),
                None => info!(scenario = %scenario.name, "no matches"),
            }
            Ok(ScenarioOutcome {
                name: scenario.name.clone(),
                matches,
                mean_score,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureEngineer;
    use steelmatch_core::{Record, Table};

    fn features() -> FeatureTable {
        let table = Table::from_records(vec![
            Record::new(1u64)
                .with_field("thickness_min", 1.0)
                .with_field("thickness_max", 2.0)
                .with_field("Carbon (C)", "0.1-0.2")
                .with_field("finish", "gi"),
            Record::new(2u64)
                .with_field("thickness_min", 1.5)
                .with_field("thickness_max", 2.5)
                .with_field("Carbon (C)", "0.15")
                .with_field("finish", "gi"),
            Record::new(3u64)
                .with_field("thickness_min", 6.0)
                .with_field("thickness_max", 8.0)
                .with_field("Carbon (C)", "0.4")
                .with_field("finish", "hot rolled"),
            Record::new(4u64)
                .with_field("thickness_min", 5.0)
                .with_field("thickness_max", 5.0)
                .with_field("Carbon (C)", "-")
                .with_field("finish", "oiled"),
        ])
        .unwrap();
        FeatureEngineer::default().engineer(&table)
    }

    #[test]
    fn test_scenario_lists() {
        let names: Vec<String> = ablation_scenarios().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            ["all_features", "dimensions_only", "grade_only", "categorical_only", "adjusted_weights"]
        );
        let adjusted = &ablation_scenarios()[4].config;
        assert_eq!(adjusted.weight(FeatureFamily::Dimensional), 0.5);
        assert_eq!(adjusted.weight(FeatureFamily::GradeProperties), 0.2);

        let comparison = comparison_scenarios();
        assert_eq!(comparison[1].config.strategy, MetricStrategy::Hybrid);
    }

    #[test]
    fn test_run_every_scenario() {
        let outcomes = run_scenarios(&features(), &ablation_scenarios()).unwrap();

        assert_eq!(outcomes.len(), 5);
        for outcome in &outcomes {
            assert_eq!(outcome.matches.len(), 4 * 3);
            assert!(outcome.mean_score.is_some());
        }
    }

    #[test]
    fn test_scenarios_are_independent() {
        let features = features();
        let alone = run_scenarios(&features, &ablation_scenarios()[1..2]).unwrap();
        let together = run_scenarios(&features, &ablation_scenarios()).unwrap();
        assert_eq!(alone[0], together[1]);
    }

    #[test]
    fn test_invalid_scenario_is_rejected() {
        let bad = Scenario::new("broken", EngineConfig::default().with_top_n(0));
        assert_eq!(run_scenarios(&features(), &[bad]), Err(ConfigError::ZeroTopN));
    }
}

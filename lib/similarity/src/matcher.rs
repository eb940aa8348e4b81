//! RFQ to inventory matching
//!
//! Scores every inventory item against each RFQ with a weighted blend of
//! dimension interval similarity and exact categorical agreement, then keeps
//! the best items per RFQ. Per-item scores are kept for explanation.

use serde::{Deserialize, Serialize};
use steelmatch_core::{GradeAliases, Record, RecordId, Table};

use crate::config::{ConfigError, IntervalMetric, DEFAULT_TOP_N};
use crate::engine::{round_score, MatchResult};
use crate::features::parse_range_value;
use crate::metrics::{categorical_match_ratio, interval_similarity};

/// Maps an RFQ bound pair onto the inventory column it is compared with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DimensionMapping {
    pub name: String,
    pub query_min: String,
    pub query_max: String,
    pub item_column: String,
}

impl DimensionMapping {
    pub fn new(name: &str, query_min: &str, query_max: &str, item_column: &str) -> Self {
        Self {
            name: name.to_string(),
            query_min: query_min.to_string(),
            query_max: query_max.to_string(),
            item_column: item_column.to_string(),
        }
    }
}

fn default_dimensions() -> Vec<DimensionMapping> {
    vec![
        DimensionMapping::new("thickness", "thickness_min", "thickness_max", "thickness_mm"),
        DimensionMapping::new("width", "width_min", "width_max", "width_mm"),
        DimensionMapping::new("weight", "weight_min", "weight_max", "gross_weight_kg"),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatcherConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_numeric_weight")]
    pub numeric_weight: f64,

    #[serde(default = "default_categorical_weight")]
    pub categorical_weight: f64,

    /// Defaults to IoU with distance decay, so scores differ from plain
    /// IoU wherever a requested interval misses the stocked value. Set
    /// `overlap` for plain intersection over union.
    #[serde(default)]
    pub interval_metric: IntervalMetric,

    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<DimensionMapping>,

    /// Compared by grade key, aliases applied
    #[serde(default = "default_grade_column")]
    pub grade_column: String,

    /// Compared as trimmed, uppercased text
    #[serde(default = "default_text_columns")]
    pub text_columns: Vec<String>,

    #[serde(default = "default_precision")]
    pub score_precision: Option<u32>,
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_numeric_weight() -> f64 {
    0.6
}

fn default_categorical_weight() -> f64 {
    0.4
}

fn default_grade_column() -> String {
    "grade".to_string()
}

fn default_text_columns() -> Vec<String> {
    vec!["finish".to_string()]
}

fn default_precision() -> Option<u32> {
    Some(3)
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            numeric_weight: default_numeric_weight(),
            categorical_weight: default_categorical_weight(),
            interval_metric: IntervalMetric::default(),
            dimensions: default_dimensions(),
            grade_column: default_grade_column(),
            text_columns: default_text_columns(),
            score_precision: default_precision(),
        }
    }
}

/// Score of one inventory item against one RFQ
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    /// Row of the item in the inventory table
    pub index: usize,
    pub id: RecordId,
    /// `numeric_weight * numeric + categorical_weight * categorical`
    pub score: f64,
    /// Mean interval similarity over the compared dimensions
    pub numeric: f64,
    /// Share of matching categorical keys
    pub categorical: f64,
    /// Interval similarity per compared dimension
    pub dimension_scores: Vec<(String, f64)>,
}

/// Ranks inventory items for each RFQ
#[derive(Debug, Clone)]
pub struct InventoryMatcher {
    config: MatcherConfig,
    aliases: GradeAliases,
}

impl InventoryMatcher {
    pub fn new(config: MatcherConfig, aliases: GradeAliases) -> Result<Self, ConfigError> {
        if config.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        for weight in [config.numeric_weight, config.categorical_weight] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidMatcherWeight(weight));
            }
        }
        if config.numeric_weight + config.categorical_weight <= 0.0 {
            return Err(ConfigError::ZeroTotalWeight);
        }
        Ok(Self { config, aliases })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Create a matcher with different blend weights
    pub fn with_weights(&self, numeric: f64, categorical: f64) -> Result<InventoryMatcher, ConfigError> {
        let config = MatcherConfig {
            numeric_weight: numeric,
            categorical_weight: categorical,
            ..self.config.clone()
        };
        InventoryMatcher::new(config, self.aliases.clone())
    }

    /// Dimensions whose columns exist on both sides
    fn compared_dimensions<'a>(&'a self, rfqs: &Table, inventory: &Table) -> Vec<&'a DimensionMapping> {
        self.config
            .dimensions
            .iter()
            .filter(|m| {
                rfqs.has_column(&m.query_min)
                    && rfqs.has_column(&m.query_max)
                    && inventory.has_column(&m.item_column)
            })
            .collect()
    }

    /// Requested interval of an RFQ.
    ///
    /// Each cell is parsed as a range, so a range typed into one bound cell
    /// supplies both bounds when the other cell is empty.
    pub fn query_interval(rfq: &Record, mapping: &DimensionMapping) -> (Option<f64>, Option<f64>) {
        let low = parse_range_value(rfq.get(&mapping.query_min));
        let high = parse_range_value(rfq.get(&mapping.query_max));
        (low.min.or(high.min), high.max.or(low.max))
    }

    fn grade_key(&self, record: &Record) -> Option<String> {
        let raw = record.get(&self.config.grade_column).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        self.aliases.join_key(raw.as_deref()).map(|k| k.to_string())
    }

    fn text_key(record: &Record, column: &str) -> Option<String> {
        record
            .get_str(column)
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
    }

    fn score_item(
        &self,
        dimensions: &[&DimensionMapping],
        rfq: &Record,
        index: usize,
        item: &Record,
    ) -> ScoredItem {
        let dimension_scores: Vec<(String, f64)> = dimensions
            .iter()
            .map(|m| {
                let (min1, max1) = Self::query_interval(rfq, m);
                let point = parse_range_value(item.get(&m.item_column));
                let score = interval_similarity(self.config.interval_metric, min1, max1, point.min, point.max);
                (m.name.clone(), score)
            })
            .collect();
        let numeric = if dimension_scores.is_empty() {
            0.0
        } else {
            dimension_scores.iter().map(|(_, s)| s).sum::<f64>() / dimension_scores.len() as f64
        };

        let mut keys = vec![(self.grade_key(rfq), self.grade_key(item))];
        for column in &self.config.text_columns {
            keys.push((Self::text_key(rfq, column), Self::text_key(item, column)));
        }
        let categorical = categorical_match_ratio(keys.iter().map(|(a, b)| (a.as_deref(), b.as_deref())));

        ScoredItem {
            index,
            id: item.id.clone(),
            score: self.config.numeric_weight * numeric + self.config.categorical_weight * categorical,
            numeric,
            categorical,
            dimension_scores,
        }
    }

    /// Every inventory item scored against one RFQ, best first.
    /// Equal scores keep inventory order.
    pub fn explain(&self, rfqs: &Table, rfq_index: usize, inventory: &Table) -> Vec<ScoredItem> {
        let Some(rfq) = rfqs.record(rfq_index) else {
            return Vec::new();
        };
        let dimensions = self.compared_dimensions(rfqs, inventory);

        let mut scored: Vec<ScoredItem> = inventory
            .iter()
            .enumerate()
            .map(|(index, item)| self.score_item(&dimensions, rfq, index, item))
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// Top-N inventory matches for every RFQ, grouped by RFQ in table order
    pub fn rank(&self, rfqs: &Table, inventory: &Table) -> Vec<MatchResult> {
        let mut results = Vec::with_capacity(rfqs.len() * self.config.top_n.min(inventory.len()));
        for (rfq_index, rfq) in rfqs.iter().enumerate() {
            for item in self.explain(rfqs, rfq_index, inventory).into_iter().take(self.config.top_n) {
                results.push(MatchResult {
                    rfq_id: rfq.id.clone(),
                    match_id: item.id,
                    similarity_score: round_score(item.score, self.config.score_precision),
                });
            }
        }
        results
    }
}

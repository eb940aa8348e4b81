//! # steelmatch similarity
//!
//! Feature engineering and similarity ranking over steel RFQ records.
//!
//! ## Features
//!
//! - **Feature Engineer**: dimension bounds, parsed property ranges and
//!   normalized categoricals from a joined record table
//! - **Similarity Engine**: per-family cosine similarity blended by weight,
//!   or the hybrid interval/categorical metric
//! - **Inventory Matcher**: ranks stock items against each RFQ
//! - **Clustering**: seeded K-means over the same feature table
//!
//! ## Example
//!
//! ```rust
//! use steelmatch_core::{Record, Table};
//! use steelmatch_similarity::{EngineConfig, FeatureEngineer, SimilarityEngine};
//!
//! let table = Table::from_records(vec![
//!     Record::new(1u64).with_field("thickness_min", 2.0).with_field("finish", "GI"),
//!     Record::new(2u64).with_field("thickness_min", 2.5).with_field("finish", "gi"),
//!     Record::new(3u64).with_field("thickness_min", 8.0).with_field("finish", "oiled"),
//! ])
//! .unwrap();
//!
//! let features = FeatureEngineer::default().engineer(&table);
//! let engine = SimilarityEngine::new(EngineConfig::default()).unwrap();
//! let matches = engine.rank(&features);
//! assert_eq!(matches.len(), 3 * 2);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Joined    │────>│  Features   │────>│  Similarity │
//! │   Records   │     │ (engineer)  │     │   Matrix    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │  K-means    │     │   Top-K     │
//!                     │ (clusters)  │     │  (matches)  │
//!                     └─────────────┘     └─────────────┘
//! ```

pub mod config;
pub mod features;
pub mod metrics;
pub mod engine;
pub mod matcher;
pub mod ablation;
pub mod cluster;

pub use config::{ConfigError, EngineConfig, FeatureFamily, IntervalMetric, MetricStrategy, DEFAULT_TOP_N};
pub use features::{FeatureEngineer, FeatureTable, UNKNOWN_CATEGORY};
pub use metrics::{categorical_match_ratio, interval_iou, interval_iou_with_decay, interval_similarity, jaccard};
pub use engine::{
    extract_top_k, mean_score, CosineBlend, HybridSimilarity, MatchResult, SimilarityEngine, SimilarityStrategy,
};
pub use matcher::{DimensionMapping, InventoryMatcher, MatcherConfig, ScoredItem};
pub use ablation::{ablation_scenarios, comparison_scenarios, run_scenarios, Scenario, ScenarioOutcome};
pub use cluster::{
    cluster, log_insights, summarize, ClusterAssignment, ClusterConfig, ClusterSummary, Clustering, KMEANS_SEED,
};

//! # steelmatch
//!
//! Feature engineering and similarity ranking for steel purchase requests.
//!
//! steelmatch turns RFQ records into comparable feature vectors, using a
//! grade reference table for chemical and mechanical properties, and ranks
//! the most similar records or inventory items for each request.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! steelmatch rank --rfqs rfq.csv --reference reference_properties.tsv
//! steelmatch ablation --rfqs rfq.csv --reference reference_properties.tsv
//! steelmatch match --rfqs rfq.csv --inventory inventory.csv
//! steelmatch cluster --rfqs rfq.csv --reference reference_properties.tsv -k 4
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use steelmatch::prelude::*;
//!
//! let rfqs = Table::from_records(vec![
//!     Record::new(1u64).with_field("grade", "S235JR").with_field("thickness_min", 2.0),
//!     Record::new(2u64).with_field("grade", "S235 J0").with_field("thickness_min", 2.5),
//! ])
//! .unwrap();
//!
//! let features = FeatureEngineer::default().engineer(&rfqs);
//! let engine = SimilarityEngine::new(EngineConfig::default()).unwrap();
//! for m in engine.rank(&features) {
//!     println!("{} -> {}: {:.3}", m.rfq_id, m.match_id, m.similarity_score);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `steelmatch-core` - records, grade keys, range parsing, vectors, the reference join
//! - `steelmatch-similarity` - features, similarity strategies, matching, clustering
//! - `steelmatch-storage` - CSV/TSV reading and atomic result writing

pub mod pipeline;
pub mod settings;

// Re-export core types
pub use steelmatch_core::{
    join_reference, parse_range, Error, GradeAliases, GradeKey, RangeTriple, Record, RecordId, Result,
    SimilarityMatrix, Table, Vector,
};

// Re-export similarity
pub use steelmatch_similarity::{
    ablation_scenarios, cluster, comparison_scenarios, run_scenarios, ClusterAssignment, ClusterConfig,
    ConfigError, EngineConfig, FeatureEngineer, FeatureFamily, FeatureTable, IntervalMetric, InventoryMatcher,
    MatchResult, MatcherConfig, MetricStrategy, Scenario, ScenarioOutcome, SimilarityEngine,
};

// Re-export storage
pub use steelmatch_storage::{read_table, write_clusters, write_matches, ReadOptions};

pub use settings::Settings;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        EngineConfig, Error, FeatureEngineer, FeatureFamily, FeatureTable, GradeAliases, GradeKey, InventoryMatcher,
        MatchResult, MatcherConfig, MetricStrategy, Record, RecordId, Result, Settings, SimilarityEngine, Table,
    };
}

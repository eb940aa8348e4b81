//! # steelmatch Core
//!
//! Core data structures for steelmatch, the RFQ-to-inventory similarity engine.
//!
//! This crate provides the building blocks shared by the feature engineer,
//! the similarity engine and the I/O adapters:
//!
//! - [`Record`] / [`Table`] - Rows keyed by [`RecordId`] with a column schema
//! - [`GradeKey`] / [`GradeAliases`] - Canonical grade designations for joins
//! - [`parse_range`] - Free-text numeric ranges into [`RangeTriple`]s
//! - [`Vector`] / [`SimilarityMatrix`] - Dense feature rows and pairwise scores
//! - [`join_reference`] - Left join onto the grade reference table
//!
//! ## Example
//!
//! ```rust
//! use steelmatch_core::{GradeKey, parse_range};
//!
//! assert_eq!(GradeKey::normalize("Steel Grade S235 JR"), GradeKey::normalize("s235jr"));
//!
//! let carbon = parse_range("0.20-0.25%");
//! assert_eq!(carbon.min, Some(0.20));
//! assert_eq!(carbon.max, Some(0.25));
//! ```

pub mod error;
pub mod record;
pub mod grade;
pub mod range;
pub mod vector;
pub mod matrix;
pub mod join;

pub use error::{Error, Result};
pub use record::{Record, RecordId, Table};
pub use grade::{GradeAliases, GradeKey};
pub use range::{parse_number, parse_range, RangeTriple};
pub use vector::{min_max_scale, Vector};
pub use matrix::SimilarityMatrix;
pub use join::{join_reference, GRADE_KEY_COLUMN};

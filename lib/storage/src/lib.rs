//! Table input and result output
//!
//! Reads delimited RFQ, inventory and reference files into record tables
//! and writes match and cluster tables atomically.

pub mod reader;
pub mod writer;

pub use reader::{read_table, read_table_from_reader, IdColumn, ReadOptions, NA_TOKENS};
pub use writer::{write_clusters, write_matches, write_scored_items};

//! Load, join and engineer
//!
//! Glue between the file adapters and the similarity crate. Every step
//! here fails before any output is written.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use steelmatch_core::{join_reference, Table};
use steelmatch_similarity::FeatureTable;
use steelmatch_storage::{read_table, IdColumn, ReadOptions};
use tracing::info;

use crate::settings::Settings;

/// Read the RFQ table; headers are lowercased
pub fn load_rfqs(path: &Path, settings: &Settings) -> Result<Table> {
    let options = ReadOptions::for_path(path)
        .with_id_column(&settings.columns.rfq_id)
        .with_lowercase_headers(true);
    read_table(path, &options)
}

/// Read the inventory table; headers are lowercased
pub fn load_inventory(path: &Path, settings: &Settings) -> Result<Table> {
    let options = ReadOptions::for_path(path)
        .with_id_column(&settings.columns.inventory_id)
        .with_lowercase_headers(true);
    read_table(path, &options)
}

/// Read the grade reference table; rows are identified by position
pub fn load_reference(path: &Path) -> Result<Table> {
    let options = ReadOptions::for_path(path).with_id(IdColumn::RowNumber);
    read_table(path, &options)
}

/// Join RFQs onto the reference table, when given, and engineer features
pub fn build_features(rfqs: &Table, reference: Option<&Table>, settings: &Settings) -> Result<FeatureTable> {
    let joined = match reference {
        Some(reference) => join_reference(
            rfqs,
            &settings.columns.grade,
            reference,
            &settings.columns.reference_key,
            &settings.aliases,
        )
        .context("Failed to join reference properties")?,
        None => rfqs.clone(),
    };
    Ok(settings.features.engineer(&joined))
}

/// Load the RFQ and reference files and return the feature table
pub fn prepare(rfq_path: &Path, reference_path: Option<&Path>, settings: &Settings) -> Result<FeatureTable> {
    info!("Loading data...");
    let rfqs = load_rfqs(rfq_path, settings)?;
    let reference = reference_path.map(load_reference).transpose()?;

    info!("Engineering features...");
    let features = build_features(&rfqs, reference.as_ref(), settings)?;
    info!(
        records = features.len(),
        properties = features.property_columns().len(),
        categoricals = features.categorical_columns().len(),
        "feature table ready"
    );
    Ok(features)
}

/// Output file of one scenario's match table
pub fn scenario_output(dir: &Path, top_n: usize, scenario: &str) -> PathBuf {
    dir.join(format!("top{top_n}_{scenario}.csv"))
}

//! Result table writers
//!
//! Output is rendered in memory and then swapped into place, so a failed
//! run never leaves a truncated file behind.

use anyhow::{anyhow, Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use steelmatch_core::RecordId;
use steelmatch_similarity::{ClusterAssignment, MatchResult, ScoredItem};
use tracing::info;

const MATCH_HEADER: [&str; 3] = ["rfq_id", "match_id", "similarity_score"];
const CLUSTER_HEADER: [&str; 2] = ["id", "cluster"];
const SCORED_HEADER: [&str; 5] = ["rfq_id", "match_id", "similarity_score", "numeric_score", "categorical_score"];

fn render<T: Serialize>(header: &[&str], rows: impl IntoIterator<Item = T>) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV buffer: {}", e.error()))
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(data))
        .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
    Ok(())
}

/// Write `rfq_id,match_id,similarity_score` rows
pub fn write_matches(path: &Path, matches: &[MatchResult]) -> Result<()> {
    let data = render(&MATCH_HEADER, matches)?;
    write_atomic(path, &data)?;
    info!(path = %path.display(), rows = matches.len(), "saved matches");
    Ok(())
}

/// Write `id,cluster` rows
pub fn write_clusters(path: &Path, assignments: &[ClusterAssignment]) -> Result<()> {
    let data = render(&CLUSTER_HEADER, assignments)?;
    write_atomic(path, &data)?;
    info!(path = %path.display(), rows = assignments.len(), "saved clustering results");
    Ok(())
}

#[derive(Serialize)]
struct ScoredRow<'a> {
    rfq_id: &'a RecordId,
    match_id: &'a RecordId,
    similarity_score: f64,
    numeric_score: f64,
    categorical_score: f64,
}

/// Write matcher results with their numeric and categorical sub-scores
pub fn write_scored_items(path: &Path, scored: &[(RecordId, Vec<ScoredItem>)]) -> Result<()> {
    let rows = scored.iter().flat_map(|(rfq_id, items)| {
        items.iter().map(move |item| ScoredRow {
            rfq_id,
            match_id: &item.id,
            similarity_score: item.score,
            numeric_score: item.numeric,
            categorical_score: item.categorical,
        })
    });
    let data = render(&SCORED_HEADER, rows)?;
    write_atomic(path, &data)?;
    info!(path = %path.display(), "saved match explanations");
    Ok(())
}

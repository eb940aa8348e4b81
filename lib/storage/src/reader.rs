//! Delimited table reader
//!
//! Cells are kept as trimmed text; feature engineering coerces numbers
//! itself. Missing-value tokens become null.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use steelmatch_core::{Record, RecordId, Table};
use tracing::debug;

/// Cell texts read as missing
pub const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A",
    "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Where a row's record id comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdColumn {
    /// A named column; a blank cell is an error
    Column(String),
    /// Zero-based data row number
    RowNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    pub delimiter: u8,
    pub id: IdColumn,
    /// Trim and lowercase header names
    pub lowercase_headers: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            id: IdColumn::Column("id".to_string()),
            lowercase_headers: false,
        }
    }
}

impl ReadOptions {
    /// Defaults with the delimiter picked from the extension: tab for
    /// `.tsv`, comma otherwise
    pub fn for_path(path: &Path) -> Self {
        let tsv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
        Self {
            delimiter: if tsv { b'\t' } else { b',' },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: IdColumn) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_id_column(self, column: &str) -> Self {
        self.with_id(IdColumn::Column(column.to_string()))
    }

    #[must_use]
    pub fn with_lowercase_headers(mut self, lowercase: bool) -> Self {
        self.lowercase_headers = lowercase;
        self
    }
}

fn cell_value(raw: &str) -> Value {
    let text = raw.trim();
    if NA_TOKENS.contains(&text) {
        Value::Null
    } else {
        Value::String(text.to_string())
    }
}

/// Read a delimited file into a table
pub fn read_table(path: &Path, options: &ReadOptions) -> Result<Table> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let table = read_table_from_reader(file, options).with_context(|| format!("Failed to read {}", path.display()))?;
    debug!(path = %path.display(), rows = table.len(), columns = table.columns().len(), "loaded table");
    Ok(table)
}

/// Read delimited data with a header row into a table
pub fn read_table_from_reader<R: Read>(input: R, options: &ReadOptions) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(|h| {
            let h = h.trim();
            if options.lowercase_headers {
                h.to_lowercase()
            } else {
                h.to_string()
            }
        })
        .collect();

    let id_index = match &options.id {
        IdColumn::Column(name) => Some(
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow!(steelmatch_core::Error::MissingColumn(name.clone())))?,
        ),
        IdColumn::RowNumber => None,
    };

    let mut table = Table::new(headers.clone());
    for (row, result) in reader.records().enumerate() {
        let raw = result.with_context(|| format!("Malformed row {}", row + 1))?;

        let id = match id_index {
            Some(index) => raw
                .get(index)
                .and_then(RecordId::parse)
                .ok_or_else(|| anyhow!(steelmatch_core::Error::MissingId(row)))?,
            None => RecordId::Integer(row as u64),
        };

        let mut record = Record::new(id);
        for (column, cell) in headers.iter().zip(raw.iter()) {
            record.set(column.as_str(), cell_value(cell));
        }
        table.push(record)?;
    }

    Ok(table)
}

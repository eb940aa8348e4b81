use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::error::{Error, Result};

/// Identifier of a record, unique within its source table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Integer(u64),
    String(String),
}

impl RecordId {
    /// Parse an identifier cell, preferring the integer form.
    /// Blank cells have no identifier.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(
            trimmed
                .parse::<u64>()
                .map(RecordId::Integer)
                .unwrap_or_else(|_| RecordId::String(trimmed.to_string())),
        )
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Integer(i) => write!(f, "{}", i),
            RecordId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::String(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::String(s.to_string())
    }
}

impl From<u64> for RecordId {
    fn from(i: u64) -> Self {
        RecordId::Integer(i)
    }
}

/// A row of an RFQ, reference, or inventory table.
///
/// Cells live in a JSON object keyed by column name; `Value::Null` and a
/// missing key both mean "absent".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl Record {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            payload: Map::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(column.into(), value.into());
        self
    }

    /// Get a present (non-null) cell
    #[inline]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.payload.get(column).filter(|v| !v.is_null())
    }

    #[inline]
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    #[inline]
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }

    #[inline]
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.payload.insert(column.into(), value);
    }
}

/// An ordered set of records sharing a column schema.
///
/// The schema lists every column the source provided, so a column that is
/// absent from a dataset revision can be told apart from a column whose
/// cells happen to be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
    ids: AHashSet<RecordId>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
            ids: AHashSet::new(),
        }
    }

    /// Build a table from records, registering every payload key as a column
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let mut table = Table::default();
        for record in records {
            table.push(record)?;
        }
        Ok(table)
    }

    /// Append a record. Identifiers must be unique within the table.
    pub fn push(&mut self, record: Record) -> Result<()> {
        if self.ids.contains(&record.id) {
            return Err(Error::DuplicateRecord(record.id.to_string()));
        }
        self.ids.insert(record.id.clone());
        for key in record.payload.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        self.records.push(record);
        Ok(())
    }

    pub fn add_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }

    #[inline]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[inline]
    pub fn record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    #[inline]
    pub fn contains(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    /// Set a cell, registering the column if it is new
    pub fn set(&mut self, row: usize, column: &str, value: Value) {
        self.add_column(column);
        if let Some(record) = self.records.get_mut(row) {
            record.set(column, value);
        }
    }

    /// Cells of one column in row order; `None` for absent cells
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = Option<&'a Value>> + 'a {
        self.records.iter().map(move |r| r.get(column))
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

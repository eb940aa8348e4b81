//! Feature engineering
//!
//! Turns a joined record table into a uniform feature table: numeric
//! dimension bounds with gap filling, `<property>_min/_max/_mid` columns
//! parsed from the reference ranges, and lowercase categorical columns with
//! an explicit `unknown` category.
//!
//! Engineering is idempotent: running it on its own output changes nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use steelmatch_core::{parse_range, RangeTriple, RecordId, Table};

/// Dimension bound column pairs, (min, max)
pub const DIMENSION_BOUNDS: [(&str, &str); 3] = [
    ("thickness_min", "thickness_max"),
    ("width_min", "width_max"),
    ("weight_min", "weight_max"),
];

pub const DIMENSION_COLUMNS: [&str; 6] = [
    "thickness_min",
    "thickness_max",
    "width_min",
    "width_max",
    "weight_min",
    "weight_max",
];

/// Chemical and mechanical property columns of the reference table
pub const DEFAULT_PROPERTY_COLUMNS: [&str; 5] = [
    "Carbon (C)",
    "Manganese (Mn)",
    "Silicon (Si)",
    "Tensile strength (Rm)",
    "Yield strength (Re or Rp0.2)",
];

pub const DEFAULT_CATEGORICAL_COLUMNS: [&str; 5] = [
    "coating",
    "finish",
    "form",
    "surface_type",
    "surface_protection",
];

/// Category given to missing categorical cells
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Derived column for one part of a parsed property range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
    Mid,
}

impl Bound {
    pub fn suffix(&self) -> &'static str {
        match self {
            Bound::Min => "_min",
            Bound::Max => "_max",
            Bound::Mid => "_mid",
        }
    }
}

/// Name of the derived column for `property`
pub fn derived_column(property: &str, bound: Bound) -> String {
    format!("{property}{}", bound.suffix())
}

/// Coerce a cell to a number. Text that is not a plain number is absent.
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Parse a cell as a range. Numbers are single values.
pub fn parse_range_value(value: Option<&Value>) -> RangeTriple {
    match value {
        Some(Value::Number(n)) => n.as_f64().map_or(RangeTriple::ABSENT, RangeTriple::scalar),
        Some(Value::String(s)) => parse_range(s),
        _ => RangeTriple::ABSENT,
    }
}

fn number_cell(value: Option<f64>) -> Value {
    value
        .and_then(Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

fn category_cell(value: Option<&Value>) -> Value {
    let text = match value {
        Some(Value::String(s)) => s.to_lowercase(),
        Some(Value::Null) | None => UNKNOWN_CATEGORY.to_string(),
        Some(other) => other.to_string().to_lowercase(),
    };
    Value::String(text)
}

/// Column lists driving feature engineering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEngineer {
    #[serde(default = "default_property_columns")]
    pub property_columns: Vec<String>,
    #[serde(default = "default_categorical_columns")]
    pub categorical_columns: Vec<String>,
}

fn default_property_columns() -> Vec<String> {
    DEFAULT_PROPERTY_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn default_categorical_columns() -> Vec<String> {
    DEFAULT_CATEGORICAL_COLUMNS.iter().map(|c| c.to_string()).collect()
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self {
            property_columns: default_property_columns(),
            categorical_columns: default_categorical_columns(),
        }
    }
}

impl FeatureEngineer {
    /// Derive the feature table. Columns missing from the input are skipped.
    pub fn engineer(&self, table: &Table) -> FeatureTable {
        let mut out = table.clone();

        for (min_col, max_col) in DIMENSION_BOUNDS {
            for col in [min_col, max_col] {
                if out.has_column(col) {
                    for row in 0..out.len() {
                        let value = coerce_number(out.records()[row].get(col));
                        out.set(row, col, number_cell(value));
                    }
                }
            }
            if out.has_column(min_col) && out.has_column(max_col) {
                for row in 0..out.len() {
                    let record = &out.records()[row];
                    match (record.get_f64(min_col), record.get_f64(max_col)) {
                        (Some(min), None) => out.set(row, max_col, number_cell(Some(min))),
                        (None, Some(max)) => out.set(row, min_col, number_cell(Some(max))),
                        _ => {}
                    }
                }
            }
        }

        let mut properties = Vec::new();
        for property in &self.property_columns {
            if !out.has_column(property) {
                continue;
            }
            for row in 0..out.len() {
                let triple = parse_range_value(out.records()[row].get(property));
                out.set(row, &derived_column(property, Bound::Min), number_cell(triple.min));
                out.set(row, &derived_column(property, Bound::Max), number_cell(triple.max));
                out.set(row, &derived_column(property, Bound::Mid), number_cell(triple.mid));
            }
            properties.push(property.clone());
        }

        let mut categoricals = Vec::new();
        for column in &self.categorical_columns {
            if !out.has_column(column) {
                continue;
            }
            for row in 0..out.len() {
                let cell = category_cell(out.records()[row].get(column));
                out.set(row, column, cell);
            }
            categoricals.push(column.clone());
        }

        FeatureTable {
            table: out,
            properties,
            categoricals,
        }
    }
}

/// A record table extended with derived feature columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    table: Table,
    properties: Vec<String>,
    categoricals: Vec<String>,
}

impl FeatureTable {
    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.table.ids()
    }

    /// Property columns that were present and parsed
    pub fn property_columns(&self) -> &[String] {
        &self.properties
    }

    /// Categorical columns that were present and normalized
    pub fn categorical_columns(&self) -> &[String] {
        &self.categoricals
    }

    /// `<property>_mid` columns, one per parsed property
    pub fn mid_columns(&self) -> Vec<String> {
        self.properties
            .iter()
            .map(|p| derived_column(p, Bound::Mid))
            .collect()
    }

    /// Every derived numeric column: property min/max/mid then dimensions
    pub fn numeric_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .properties
            .iter()
            .flat_map(|p| {
                [Bound::Min, Bound::Max, Bound::Mid]
                    .into_iter()
                    .map(move |b| derived_column(p, b))
            })
            .collect();
        columns.extend(DIMENSION_COLUMNS.iter().map(|c| c.to_string()));
        columns
    }

    /// Numeric cell; absent when missing or non-numeric
    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.table.record(row).and_then(|r| r.get_f64(column))
    }

    /// Categorical cell as text
    pub fn category(&self, row: usize, column: &str) -> Option<&str> {
        self.table.record(row).and_then(|r| r.get_str(column))
    }

    /// (min, max) of one dimension for a row
    pub fn interval(&self, row: usize, bounds: (&str, &str)) -> (Option<f64>, Option<f64>) {
        (self.number(row, bounds.0), self.number(row, bounds.1))
    }
}

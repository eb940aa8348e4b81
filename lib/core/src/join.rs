//! Left join of records onto the grade reference table

use ahash::AHashMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::grade::{GradeAliases, GradeKey};
use crate::record::{Record, Table};

/// Column holding the resolved grade key on joined tables
pub const GRADE_KEY_COLUMN: &str = "grade_key";

/// Suffix given to reference columns that collide with left-hand columns
pub const REFERENCE_SUFFIX: &str = "_ref";

/// Attach reference properties to each record by grade key.
///
/// Aliases apply to both sides. The first reference row per key wins. A
/// record whose grade has no reference row keeps every reference-sourced
/// column absent and still takes part in later scoring.
pub fn join_reference(
    left: &Table,
    grade_column: &str,
    reference: &Table,
    reference_key_column: &str,
    aliases: &GradeAliases,
) -> Result<Table> {
    if !left.has_column(grade_column) {
        return Err(Error::MissingColumn(grade_column.to_string()));
    }
    if !reference.has_column(reference_key_column) {
        return Err(Error::MissingColumn(reference_key_column.to_string()));
    }

    let mut by_key: AHashMap<GradeKey, &Record> = AHashMap::new();
    for row in reference {
        if let Some(key) = aliases.join_key(cell_text(row.get(reference_key_column)).as_deref()) {
            by_key.entry(key).or_insert(row);
        }
    }

    // (reference column, output column)
    let carried: Vec<(&str, String)> = reference
        .columns()
        .iter()
        .filter(|c| c.as_str() != reference_key_column)
        .map(|c| {
            let target = if left.has_column(c) || c.as_str() == GRADE_KEY_COLUMN {
                format!("{c}{REFERENCE_SUFFIX}")
            } else {
                c.clone()
            };
            (c.as_str(), target)
        })
        .collect();

    let mut columns = left.columns().to_vec();
    columns.push(GRADE_KEY_COLUMN.to_string());
    columns.extend(carried.iter().map(|(_, target)| target.clone()));
    let mut joined = Table::new(columns);

    for record in left {
        let key = aliases.join_key(cell_text(record.get(grade_column)).as_deref());
        let matched = key.as_ref().and_then(|k| by_key.get(k));

        let mut out = record.clone();
        out.set(
            GRADE_KEY_COLUMN,
            key.as_ref().map_or(Value::Null, |k| Value::String(k.to_string())),
        );
        for (source, target) in &carried {
            let value = matched
                .and_then(|row| row.get(source))
                .cloned()
                .unwrap_or(Value::Null);
            out.set(target.clone(), value);
        }
        joined.push(out)?;
    }

    Ok(joined)
}

/// Text form of a cell, so numeric-looking grades still join
fn cell_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

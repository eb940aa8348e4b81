//! Range parsing for free-text numeric cells
//!
//! Reference and supplier data mix single values, ranges, embedded units and
//! thousands separators ("0.20-0.25%", "350 MPa", "1,250"). Characters other
//! than digits and the decimal point are filtered out before conversion, which
//! tolerates all of these without a full grammar.

use serde::{Deserialize, Serialize};

/// Sentinel used in source sheets for "no value"
pub const EMPTY_SENTINEL: &str = "-";

/// Parsed (min, max, mid) of a numeric range.
///
/// Unparsable input is all `None`. Zero is a real value and stays distinct
/// from absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeTriple {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mid: Option<f64>,
}

impl RangeTriple {
    pub const ABSENT: RangeTriple = RangeTriple {
        min: None,
        max: None,
        mid: None,
    };

    /// A single value: min = max = mid
    pub fn scalar(value: f64) -> Self {
        Self {
            min: Some(value),
            max: Some(value),
            mid: Some(value),
        }
    }

    /// Two bounds, reordered so that min <= max
    pub fn bounds(a: f64, b: f64) -> Self {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        Self {
            min: Some(min),
            max: Some(max),
            mid: Some((min + max) / 2.0),
        }
    }

    #[inline]
    pub fn is_absent(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.mid.is_none()
    }
}

/// Parse a single value or a "min-max" range.
///
/// En-dashes count as hyphens. A hyphenated string must split into exactly
/// two numeric parts; otherwise the whole string is read as one value.
pub fn parse_range(raw: &str) -> RangeTriple {
    let value = raw.trim();
    if value.is_empty() || value == EMPTY_SENTINEL {
        return RangeTriple::ABSENT;
    }

    let value = value.replace('\u{2013}', "-");
    if value.contains('-') {
        let parts: Vec<&str> = value.split('-').collect();
        if let [low, high] = parts.as_slice() {
            if let (Some(min), Some(max)) = (parse_number(low), parse_number(high)) {
                return RangeTriple::bounds(min, max);
            }
        }
    }

    match parse_number(&value) {
        Some(v) => RangeTriple::scalar(v),
        None => RangeTriple::ABSENT,
    }
}

/// Parse the numeric content of a cell, ignoring units, signs and commas.
pub fn parse_number(raw: &str) -> Option<f64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();

    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

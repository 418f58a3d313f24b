//! Spreadsheet cell to VAT string normalisation.

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;

/// A raw cell value as read from a spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Blank or null cell.
    Empty,
    /// Numeric cell. Spreadsheets store digit-only VAT numbers this way.
    Number(f64),
    /// Text cell, taken as-is apart from trimming.
    Text(String),
    Bool(bool),
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

static SCIENTIFIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?[eE][+-]?\d+$").expect("static regex"));

/// Turn a cell into a canonical VAT string.
///
/// Returns `None` for blank cells: the row is skipped, not failed.
/// Never panics; numeric forms that cannot be expanded fall back to
/// their plain string representation.
pub fn normalize_cell(cell: &CellValue) -> Option<String> {
    let text = match cell {
        CellValue::Empty => return None,
        CellValue::Number(n) => number_to_string(*n),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if SCIENTIFIC.is_match(trimmed) {
                expand_scientific(trimmed).unwrap_or_else(|| trimmed.to_string())
            } else {
                trimmed.to_string()
            }
        }
    };

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn number_to_string(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    // f64 Display never uses an exponent and drops a zero fraction:
    // 123456780.0 -> "123456780", 1.23e10 -> "12300000000".
    format!("{n}")
}

fn expand_scientific(s: &str) -> Option<String> {
    // Decimal holds at most 28 digits of scale or magnitude.
    let exponent: i32 = s.split(['e', 'E']).nth(1)?.parse().ok()?;
    if exponent.abs() > 28 {
        return None;
    }
    let value = Decimal::from_scientific(s).ok()?;
    let value = if value.fract().is_zero() {
        value.trunc()
    } else {
        value
    };
    Some(value.normalize().to_string())
}

//! Turn uploaded cells into pipeline rows.

use super::normalize::{CellValue, normalize_cell};
use super::parse::clean_vat_number;
use crate::core::{Requester, ValidationRow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One uploaded row before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// The VAT cell.
    pub cell: CellValue,
    /// Own VAT number for authenticated lookups, with country prefix.
    pub requester: Option<String>,
    /// Company name the user expects for this VAT number.
    pub expected_name: Option<String>,
}

impl RawRow {
    pub fn new(cell: impl Into<CellValue>) -> Self {
        Self {
            cell: cell.into(),
            requester: None,
            expected_name: None,
        }
    }

    pub fn requester(mut self, vat: impl Into<String>) -> Self {
        self.requester = Some(vat.into());
        self
    }

    pub fn expected_name(mut self, name: impl Into<String>) -> Self {
        self.expected_name = Some(name.into());
        self
    }
}

/// A later row repeating an earlier row's normalised VAT string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRow {
    pub index: usize,
    /// Index of the first row with the same VAT string.
    pub first_index: usize,
    pub vat: String,
}

/// Rows ready for dispatch plus the rows kept out of it.
#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
    /// Rows to validate, in upload order.
    pub rows: Vec<ValidationRow>,
    /// Indices of blank cells.
    pub skipped: Vec<usize>,
    /// Repeated VAT numbers, always reported.
    pub duplicates: Vec<DuplicateRow>,
    /// Number of uploaded rows, blank ones included.
    pub total_rows: usize,
}

/// Normalise and parse every uploaded row.
///
/// Duplicate detection compares normalised strings exactly. With
/// `skip_duplicates`, repeated rows are reported but not validated again.
/// Parse failures are kept as rows without country/number so they come
/// out as format errors.
pub fn prepare_rows(raw: Vec<RawRow>, skip_duplicates: bool) -> PreparedBatch {
    let mut batch = PreparedBatch {
        total_rows: raw.len(),
        ..Default::default()
    };
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (index, row) in raw.into_iter().enumerate() {
        let Some(vat) = normalize_cell(&row.cell) else {
            batch.skipped.push(index);
            continue;
        };

        if let Some(&first_index) = seen.get(&vat) {
            batch.duplicates.push(DuplicateRow {
                index,
                first_index,
                vat: vat.clone(),
            });
            if skip_duplicates {
                continue;
            }
        } else {
            seen.insert(vat.clone(), index);
        }

        let (country, number) = match clean_vat_number(&vat) {
            Ok(parsed) => (Some(parsed.country), Some(parsed.number)),
            Err(_) => (None, None),
        };

        let requester = row.requester.as_deref().and_then(|r| match clean_vat_number(r) {
            Ok(parsed) => Some(Requester {
                country: parsed.country,
                number: parsed.number,
            }),
            Err(e) => {
                tracing::warn!(row = index, error = %e, "ignoring malformed requester VAT");
                None
            }
        });

        let expected_name = row
            .expected_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        batch.rows.push(ValidationRow {
            index,
            raw: raw_text(&row.cell),
            vat,
            country,
            number,
            requester,
            expected_name,
        });
    }

    if !batch.duplicates.is_empty() {
        tracing::info!(
            duplicates = batch.duplicates.len(),
            dropped = skip_duplicates,
            "duplicate VAT numbers in batch"
        );
    }
    batch
}

fn raw_text(cell: &CellValue) -> String {
    match cell {
        CellValue::Empty => String::new(),
        CellValue::Number(n) => n.to_string(),
        CellValue::Text(s) => s.clone(),
        CellValue::Bool(b) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blanks_are_skipped_with_original_index() {
        let batch = prepare_rows(
            vec![
                RawRow::new("DK47458714"),
                RawRow::new(CellValue::Empty),
                RawRow::new("  "),
                RawRow::new("SE556074308901"),
            ],
            true,
        );
        assert_eq!(batch.total_rows, 4);
        assert_eq!(batch.skipped, vec![1, 2]);
        let indices: Vec<usize> = batch.rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 3]);
    }

    #[test]
    fn duplicates_reported_and_dropped() {
        let batch = prepare_rows(
            vec![
                RawRow::new("DK47458714"),
                RawRow::new("DK13598562"),
                RawRow::new("DK47458714"),
            ],
            true,
        );
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(
            batch.duplicates,
            vec![DuplicateRow {
                index: 2,
                first_index: 0,
                vat: "DK47458714".into()
            }]
        );
    }

    #[test]
    fn duplicates_kept_when_not_skipping() {
        let batch = prepare_rows(
            vec![RawRow::new("DK47458714"), RawRow::new("DK47458714")],
            false,
        );
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.duplicates.len(), 1);
    }

    #[test]
    fn duplicate_match_is_exact() {
        // Same number, different spacing: not a duplicate.
        let batch = prepare_rows(
            vec![RawRow::new("DK47458714"), RawRow::new("DK 47458714")],
            true,
        );
        assert_eq!(batch.rows.len(), 2);
        assert!(batch.duplicates.is_empty());
    }

    #[test]
    fn unparsable_rows_are_kept() {
        let batch = prepare_rows(vec![RawRow::new(CellValue::Number(47458714.0))], true);
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].vat, "47458714");
        assert!(batch.rows[0].country.is_none());
    }

    #[test]
    fn requester_and_name_parsed() {
        let batch = prepare_rows(
            vec![
                RawRow::new("DK47458714")
                    .requester("DK 13 59 85 62")
                    .expected_name("  LEGO "),
                RawRow::new("DK13598562").requester("???").expected_name(""),
            ],
            true,
        );
        let first = &batch.rows[0];
        assert_eq!(
            first.requester,
            Some(Requester {
                country: "DK".into(),
                number: "13598562".into()
            })
        );
        assert_eq!(first.expected_name.as_deref(), Some("LEGO"));
        assert!(batch.rows[1].requester.is_none());
        assert!(batch.rows[1].expected_name.is_none());
    }
}

#![cfg(feature = "core")]

use eu_vat_bulk::vat::*;
use eu_vat_bulk::{FormatErrorKind, VatFormatError};

/// Clean, then check the country pattern, the way a batch row goes through.
fn check(input: &str) -> Result<ParsedVat, VatFormatError> {
    let parsed = clean_vat_number(input)?;
    validate_vat_format(&parsed.country, &parsed.number)?;
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Cleaning and format, real-world spellings
// ---------------------------------------------------------------------------

#[test]
fn dk_with_spaces() {
    let parsed = check("DK 47 45 87 14").unwrap();
    assert_eq!(parsed.full(), "DK47458714");
}

#[test]
fn de_with_dashes_and_lowercase() {
    let parsed = check("de-123.456.789").unwrap();
    assert_eq!(parsed.country, "DE");
    assert_eq!(parsed.number, "123456789");
}

#[test]
fn de_leading_zero_rejected() {
    let err = check("DE012345678").unwrap_err();
    assert_eq!(err.kind, FormatErrorKind::Pattern);
}

#[test]
fn at_needs_u() {
    assert!(check("ATU12345678").is_ok());
    assert!(check("AT12345678").is_err());
}

#[test]
fn fr_alphanumeric_key() {
    assert!(check("FR XX 123456789").is_ok());
    assert!(check("FR 1A 123456789").is_ok());
    assert!(check("FR 123456789").is_err());
}

#[test]
fn nl_btw_number() {
    assert!(check("NL 8060.73.223.B01").is_ok());
    assert!(check("NL806073223C01").is_err());
}

#[test]
fn es_letters_at_ends() {
    assert!(check("ESX1234567X").is_ok());
    assert!(check("ESB12345678").is_ok());
    assert!(check("ES123456789").is_ok());
    assert!(check("ES12345678").is_err());
}

#[test]
fn ie_old_and_new_style() {
    assert!(check("IE6388047V").is_ok());
    assert!(check("IE1234567WA").is_ok());
    assert!(check("IE8Z49289F").is_ok());
    assert!(check("IE12345678").is_err());
}

#[test]
fn se_must_end_in_01() {
    assert!(check("SE556074308901").is_ok());
    assert!(check("SE556074308902").is_err());
}

#[test]
fn lt_nine_or_twelve() {
    assert!(check("LT123456789").is_ok());
    assert!(check("LT123456789012").is_ok());
    assert!(check("LT1234567890").is_err());
}

#[test]
fn greece_is_el() {
    assert!(check("EL094259216").is_ok());
    let err = check("GR094259216").unwrap_err();
    assert_eq!(err.kind, FormatErrorKind::UnknownCountry);
}

#[test]
fn northern_ireland_forms() {
    assert!(check("XI123456789").is_ok());
    assert!(check("XIGD123").is_ok());
    assert!(check("XIHA999").is_ok());
    assert!(check("XIAB123").is_err());
}

#[test]
fn non_eu_country_rejected() {
    let err = check("GB123456789").unwrap_err();
    assert_eq!(err.kind, FormatErrorKind::UnknownCountry);
    assert!(err.to_string().contains("GB123456789"));
}

#[test]
fn missing_number() {
    let err = check("DK").unwrap_err();
    assert_eq!(err.kind, FormatErrorKind::MissingNumber);
}

#[test]
fn digits_only_has_no_country() {
    let err = check("47458714").unwrap_err();
    assert_eq!(err.kind, FormatErrorKind::MissingCountryCode);
}

#[test]
fn table_covers_every_member_state() {
    let codes: Vec<&str> = supported_countries().map(|f| f.code).collect();
    for code in [
        "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "EL", "ES", "FI", "FR", "HR", "HU", "IE",
        "IT", "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK", "XI",
    ] {
        assert!(codes.contains(&code), "{code} missing");
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet cells
// ---------------------------------------------------------------------------

#[test]
fn numeric_cell_without_prefix_is_format_error() {
    let text = normalize_cell(&CellValue::Number(47458714.0)).unwrap();
    assert_eq!(text, "47458714");
    assert!(check(&text).is_err());
}

#[test]
fn scientific_text_cell() {
    let text = normalize_cell(&CellValue::from("1.23456789E8")).unwrap();
    assert_eq!(text, "123456789");
}

#[test]
fn prepared_batch_from_mixed_cells() {
    let batch = prepare_rows(
        vec![
            RawRow::new("DK47458714").requester("DK13598562"),
            RawRow::new(CellValue::Empty),
            RawRow::new(" "),
            RawRow::new("nonsense"),
            RawRow::new("DK47458714"),
            RawRow::new("SE556074308901").requester("not a vat"),
        ],
        false,
    );
    assert_eq!(batch.total_rows, 6);
    assert_eq!(batch.skipped, vec![1, 2]);
    assert_eq!(batch.rows.len(), 4);
    assert_eq!(batch.duplicates.len(), 1);
    assert_eq!(batch.duplicates[0].index, 4);

    let first = &batch.rows[0];
    assert_eq!(first.requester.as_ref().map(|r| r.number.as_str()), Some("13598562"));

    // Parses as country "NO"; the format check rejects it later.
    let nonsense = &batch.rows[1];
    assert_eq!(nonsense.index, 3);
    assert_eq!(nonsense.country.as_deref(), Some("NO"));
    assert!(check(&nonsense.vat).is_err());

    assert!(batch.rows[3].requester.is_none());
}

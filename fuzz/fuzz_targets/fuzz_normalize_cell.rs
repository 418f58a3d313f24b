#![no_main]

use eu_vat_bulk::vat::{CellValue, normalize_cell};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = normalize_cell(&CellValue::from(s));
    }
    if data.len() >= 8 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&data[..8]);
        let _ = normalize_cell(&CellValue::Number(f64::from_le_bytes(bytes)));
    }
});

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(parsed) = eu_vat_bulk::vat::clean_vat_number(s) {
            let _ = eu_vat_bulk::vat::validate_vat_format(&parsed.country, &parsed.number);
        }
    }
});

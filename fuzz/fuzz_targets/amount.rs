#![no_main]

use libcaixa::amount::{format_brl, parse_amount_str};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let amount = parse_amount_str(s);
        assert!(amount.is_finite());
        let _ = format_brl(amount);
    }
});

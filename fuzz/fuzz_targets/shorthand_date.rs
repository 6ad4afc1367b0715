#![no_main]

use chrono::Timelike;
use libcaixa::date::parse_shorthand;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(date) = parse_shorthand(s, 2025) {
            assert_eq!(date.hour(), 12);
        }
    }
});

#![no_main]

use libcaixa::parser::parse_a1;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(range) = parse_a1(s) {
            // whatever parses must print back to something that parses the same
            assert_eq!(parse_a1(&range.to_string()).ok(), Some(range));
        }
    }
});

//! Fuzz target for dataset manifest parsing.

#![no_main]

use boxseed::manifest::fuzz_parse_manifest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = fuzz_parse_manifest(text);
    }
});

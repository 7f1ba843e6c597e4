#![no_main]
use libfuzzer_sys::fuzz_target;
use prdeploy_core::environment::{DocumentFormat, Whitelist};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        for format in [DocumentFormat::Json, DocumentFormat::Yaml] {
            if let Ok(whitelist) = Whitelist::parse(s, format) {
                // Accepted documents never resolve an empty name
                assert!(whitelist.resolve("").is_err());
            }
        }
    }
});

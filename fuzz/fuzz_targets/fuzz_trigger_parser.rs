#![no_main]
use libfuzzer_sys::fuzz_target;
use prdeploy_core::trigger::{TriggerMatch, TriggerParser};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // First line is the phrase, the rest the comment body
        let (phrase, body) = s.split_once('\n').unwrap_or((s, ""));
        let parser = TriggerParser::new(phrase);
        match parser.parse(body) {
            TriggerMatch::NoMatch => {}
            m @ TriggerMatch::Matched { environment_raw } => {
                assert!(!environment_raw.contains('\n'));
                let env = m.environment().unwrap();
                assert!(!env.is_empty());
                assert_eq!(env, env.trim());
            }
        }
    }
});

#![no_main]
use libfuzzer_sys::fuzz_target;
use prdeploy_core::event::{CommentEvent, EventKind};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(EventKind::Comment(event)) = CommentEvent::parse(s) {
            assert!(event.repo.contains('/'));
        }
    }
});

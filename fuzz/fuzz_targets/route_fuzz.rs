//! Fuzz test for dashboard route parsing
//!
//! Paths come from persisted state and from the command line, so any string
//! must parse or be rejected without panicking. Every accepted path must
//! print back to a path that parses to the same route.
//!
//! Run with: cargo +nightly fuzz run route_fuzz -- -max_total_time=60

#![no_main]

use airsense_tui::nav::{guard, Route};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Some(route) = Route::parse(input) else {
        return;
    };

    assert_eq!(Route::parse(&route.path()), Some(route));
    assert!(!guard(route, false).requires_auth());
    assert!(!guard(route, true).guest_only());

    let mut current = route;
    let mut depth = 0;
    while let Some(parent) = current.up() {
        current = parent;
        depth += 1;
        assert!(depth <= 4, "up() must reach the top");
    }
});

//! Fuzz test for listing envelope decoding
//!
//! Listing bodies come straight from the network. Decoding may fail, but
//! the pagination helpers must never panic on whatever numbers decode.
//!
//! Run with: cargo +nightly fuzz run page_fuzz -- -max_total_time=60

#![no_main]

use airsense_core::{Page, Sensor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(page) = serde_json::from_slice::<Page<Sensor>>(data) else {
        return;
    };

    let _ = page.has_more();
    for page_size in [0, 1, page.len() as u64, u64::MAX] {
        let count = page.page_count(page_size);
        if page_size > 0 {
            assert!(count <= page.pagination.total);
        }
    }
    for sensor in &page.data {
        let _ = sensor.label();
    }
});

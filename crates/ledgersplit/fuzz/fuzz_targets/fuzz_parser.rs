//! Fuzz target for the upload path.
//!
//! This fuzzer tests that parsing and splitting:
//! 1. Never panic on malformed input
//! 2. Either fail with a typed error or account for every row

#![no_main]

use ledgersplit::{Splitter, SplitterConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let Ok(splitter) = Splitter::new(SplitterConfig::default()) else {
        return;
    };

    if let Ok(report) = splitter.split_bytes(data, "fuzz.csv") {
        assert_eq!(
            report.partition.row_count() + report.excluded.len(),
            report.summary.input_rows
        );
    }
});

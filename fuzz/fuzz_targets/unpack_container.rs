#![no_main]
use ison_pack::{read_document, Compress, InterningTable, VersionProfile, SMALL_CAPACITY};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let profile = VersionProfile::new(
        "fuzz",
        SMALL_CAPACITY,
        Compress::default(),
        Arc::new(InterningTable::default()),
    )
    .unwrap();
    let mut raw = vec![0u8; SMALL_CAPACITY];
    let len = data.len().min(SMALL_CAPACITY);
    raw[..len].copy_from_slice(&data[..len]);
    let _ = read_document(&raw, &profile);
});

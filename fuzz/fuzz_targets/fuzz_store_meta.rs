//! Fuzz target: store metadata decoder
//!
//! Feeds arbitrary bytes to `StoreMeta::decode` and checks:
//! - No panics on any input
//! - Anything accepted has a slot-aligned partition width and ordered cursors
//! - Accepted metadata re-encodes to bytes that decode to the same value
//!
//! cargo fuzz run fuzz_store_meta

#![no_main]

use fermenter::store::StoreMeta;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(meta) = StoreMeta::decode(data) else {
        return;
    };
    assert!(meta.seconds_per_partition > 0);
    assert_eq!(meta.seconds_per_partition % 60, 0);
    if let (Some(first), Some(last)) = (meta.first_entry, meta.last_entry) {
        assert!(first <= last);
    }
    let bytes = meta.encode().expect("encode accepted metadata");
    assert_eq!(StoreMeta::decode(&bytes).ok(), Some(meta));
});

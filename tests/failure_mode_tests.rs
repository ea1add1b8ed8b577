//! A failed spill poisons the Deduper and `extract_into` surfaces the
//! error, leaving the sink untouched. Only meaningful with the
//! `failpoints` feature, which replaces a real disk-exhaustion trigger with
//! a deterministic, named failure point.

#![cfg(feature = "failpoints")]

use std::sync::Arc;

use dedup_core::{Error, KeyWidth, LexicographicComparator, TempConfig};
use dedup_engine::{BufferSink, Deduper, ExtractSink};
use dedup_storage::failpoints::{arm, disarm};

fn temp(prefix: &str) -> (tempfile::TempDir, TempConfig) {
    let dir = tempfile::tempdir().unwrap();
    let cfg = TempConfig::new(dir.path(), prefix);
    (dir, cfg)
}

#[test]
fn injected_write_failure_poisons_deduper_and_leaves_sink_empty() {
    let (_guard, cfg) = temp("spill-failure-poisoning");
    let width = 4usize;
    let m = 2 * (width + 48); // K_max == 2
    let mut d = Deduper::new(
        Arc::new(LexicographicComparator),
        KeyWidth::new(width).unwrap(),
        m,
        &cfg,
        1,
    )
    .unwrap();

    d.put(&1u32.to_be_bytes()).unwrap();
    d.put(&2u32.to_be_bytes()).unwrap();
    d.put(&3u32.to_be_bytes()).unwrap(); // first spill, succeeds
    assert_eq!(d.spilled_count(), 2);

    arm("spill_write");
    d.put(&4u32.to_be_bytes()).unwrap();
    let put_err = d.put(&5u32.to_be_bytes()).unwrap_err(); // second spill fails
    assert!(matches!(put_err, Error::SpillWriteFailure(_)));

    let mut sink = BufferSink::new();
    let extract_err = d.extract_into(&mut sink).unwrap_err();
    assert!(matches!(extract_err, Error::SpillWriteFailure(_)));
    assert!(sink.into_inner().is_empty(), "sink must receive no partial output");

    disarm("spill_write");

    // The Deduper is poisoned: even a clean extract_into is rejected now.
    let mut sink2 = BufferSink::new();
    let err = d.extract_into(&mut sink2).unwrap_err();
    assert!(matches!(err, Error::InvalidPhase(_)));
}

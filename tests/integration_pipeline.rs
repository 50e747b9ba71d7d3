//! Integration tests for the pipeline module.
//!
//! These tests verify end-to-end pipeline behavior including:
//! - Deterministic, order-independent results
//! - The global cap on the limited digest
//! - Stages overlapping in time
//! - Failures surfacing with stage and item context

use crossbeam_channel::bounded;
use signer_pipeline::core::digest::{Digests, FnDigest, Md5Digest, Xxh32Digest};
use signer_pipeline::core::pipeline::Pipeline;
use signer_pipeline::core::stage::{Combine, FnStage, MultiHash, SingleHash};
use signer_pipeline::core::Item;
use signer_pipeline::error::{DigestError, PipelineError, StageError};
use signer_pipeline::events::EventChannel;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// `F(s)` / `G(s)` wrapper stubs
fn stub_digests() -> Digests {
    Digests::new(
        FnDigest::new("F", |s| format!("F({s})")),
        FnDigest::new("G", |s| format!("G({s})")),
    )
}

/// Counts how many calls of the limited digest overlap
#[derive(Default)]
struct ConcurrencyGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

fn gauged_digests(gauge: Arc<ConcurrencyGauge>) -> Digests {
    Digests::new(
        FnDigest::new("F", |s| format!("F({s})")),
        FnDigest::new("G", move |s| {
            let now = gauge.active.fetch_add(1, Ordering::SeqCst) + 1;
            gauge.peak.fetch_max(now, Ordering::SeqCst);
            gauge.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
            gauge.active.fetch_sub(1, Ordering::SeqCst);
            format!("G({s})")
        }),
    )
}

#[test]
fn single_hash_and_combine_end_to_end() {
    let pipeline = Pipeline::builder()
        .worker(SingleHash::new())
        .stage(Combine::new())
        .digests(stub_digests())
        .build();

    let result = pipeline.execute(vec![1, 2, 3]).unwrap();

    assert_eq!(result, "G(1)~G(F(1))_G(2)~G(F(2))_G(3)~G(F(3))");
}

#[test]
fn full_signer_chain_on_one_item() {
    let pipeline = Pipeline::signer(stub_digests());

    let result = pipeline.execute(vec!["x"]).unwrap();

    let single = "G(x)~G(F(x))";
    let expected: String = (0..6).map(|i| format!("G({i}{single})")).collect();
    assert_eq!(result, expected);
}

#[test]
fn multi_hash_keeps_index_order() {
    let pipeline = Pipeline::builder()
        .worker(MultiHash::new())
        .digests(stub_digests())
        .build();

    let result = pipeline.run(vec!["x"]).unwrap();

    assert_eq!(
        result.outputs,
        vec![Item::from("G(0x)G(1x)G(2x)G(3x)G(4x)G(5x)")]
    );
}

#[test]
fn repeated_runs_are_identical() {
    let pipeline = Pipeline::signer(Digests::new(Md5Digest, Xxh32Digest::default()));
    let items = vec![0, 1, 1, 2, 3, 5, 8];

    let first = pipeline.execute(items.clone()).unwrap();
    for _ in 0..4 {
        assert_eq!(pipeline.execute(items.clone()).unwrap(), first);
    }
}

#[test]
fn input_order_does_not_change_result() {
    let pipeline = Pipeline::signer(stub_digests());

    let forward = pipeline.execute(vec![1, 2, 3, 4]).unwrap();
    let backward = pipeline.execute(vec![4, 3, 2, 1]).unwrap();

    assert_eq!(forward, backward);
}

#[test]
fn limited_digest_never_runs_concurrently() {
    let gauge = Arc::new(ConcurrencyGauge::default());
    let pipeline = Pipeline::signer(gauged_digests(Arc::clone(&gauge)));
    let items: Vec<i64> = (0..12).collect();

    let result = pipeline.run(items).unwrap();

    assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
    // Two calls per item in SingleHash, six in MultiHash
    assert_eq!(gauge.calls.load(Ordering::SeqCst), 12 * 8);
    assert_eq!(result.limiter.acquisitions, 12 * 8);
    assert_eq!(result.limiter.peak_concurrency, 1);
}

#[test]
fn stages_overlap_in_time() {
    let (seen_tx, seen_rx) = bounded::<()>(1);

    let pipeline = Pipeline::builder()
        .stage(FnStage::new("producer", move |_ctx, input, output| {
            let mut emitted = 0;
            for (position, item) in input.iter().enumerate() {
                output.push(item)?;
                emitted += 1;
                if position == 0 {
                    // Only returns if the consumer runs while we are still producing
                    seen_rx
                        .recv_timeout(Duration::from_secs(5))
                        .map_err(|_| StageError::Custom("consumer never started".to_string()))?;
                }
            }
            Ok(emitted)
        }))
        .stage(FnStage::new("consumer", move |_ctx, input, output| {
            let mut emitted = 0;
            for item in input.iter() {
                if emitted == 0 {
                    let _ = seen_tx.send(());
                }
                output.push(item)?;
                emitted += 1;
            }
            Ok(emitted)
        }))
        .build();

    let result = pipeline.run(vec![1, 2, 3]).unwrap();

    assert_eq!(result.outputs.len(), 3);
}

#[test]
fn small_queues_apply_backpressure_without_losing_items() {
    let pipeline = Pipeline::builder()
        .worker(SingleHash::new())
        .worker(MultiHash::with_width(2).unwrap())
        .stage(Combine::new())
        .digests(stub_digests())
        .queue_capacity(1)
        .build();
    let items: Vec<i64> = (0..20).collect();

    let result = pipeline.execute(items).unwrap();

    assert_eq!(result.split('_').count(), 20);
}

#[test]
fn intermediate_results_are_streamed_as_events() {
    let (sender, receiver) = EventChannel::new();
    let pipeline = Pipeline::signer(stub_digests());

    pipeline.run_with_events(vec![1, 2, 3], &sender).unwrap();
    drop(sender);

    let outputs: Vec<_> = receiver.item_outputs().collect();

    let single: Vec<_> = outputs.iter().filter(|o| o.stage == "SingleHash").collect();
    let multi: Vec<_> = outputs.iter().filter(|o| o.stage == "MultiHash").collect();
    let combined: Vec<_> = outputs.iter().filter(|o| o.stage == "Combine").collect();
    assert_eq!(single.len(), 3);
    assert_eq!(multi.len(), 3);
    assert_eq!(combined.len(), 1);
    assert!(single.iter().any(|o| o.output == "G(2)~G(F(2))"));
}

#[test]
fn malformed_item_fails_the_run() {
    let pipeline = Pipeline::signer(stub_digests());

    let error = pipeline
        .execute(vec![Item::from(1), Item::from(vec![0xC3u8, 0x28]), Item::from(3)])
        .unwrap_err();

    match error {
        PipelineError::Stage { stage, source } => {
            assert_eq!(stage, "SingleHash");
            assert!(matches!(source, StageError::Item { position: 1, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn digest_failure_fails_the_run() {
    let pipeline = Pipeline::signer(Digests::new(
        FnDigest::new("F", |s| format!("F({s})")),
        FnDigest::fallible("G", |s| {
            if s == "2" {
                Err(DigestError::Failed {
                    digest: "G".to_string(),
                    input: s.to_string(),
                    reason: "backend unavailable".to_string(),
                })
            } else {
                Ok(format!("G({s})"))
            }
        }),
    ));

    let error = pipeline.execute(vec![1, 2, 3]).unwrap_err();

    assert_eq!(error.stage(), Some("SingleHash"));
    assert!(error.to_string().contains("backend unavailable"));
}

#[test]
fn failure_aborts_outstanding_work() {
    let gauge = Arc::new(ConcurrencyGauge::default());
    let limited = Arc::clone(&gauge);
    let pipeline = Pipeline::signer(Digests::new(
        FnDigest::fallible("F", |s| {
            if s == "0" {
                Err(DigestError::Failed {
                    digest: "F".to_string(),
                    input: s.to_string(),
                    reason: "backend unavailable".to_string(),
                })
            } else {
                Ok(format!("F({s})"))
            }
        }),
        FnDigest::new("G", move |s| {
            limited.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
            format!("G({s})")
        }),
    ));
    let items: Vec<i64> = (0..200).collect();

    let error = pipeline.execute(items).unwrap_err();

    assert_eq!(error.stage(), Some("SingleHash"));
    // A full run would need 200 * 8 limited calls
    let calls = gauge.calls.load(Ordering::SeqCst);
    assert!(calls < 200, "{calls} limited calls after the failure");
}

#[test]
fn panicking_digest_is_reported() {
    let pipeline = Pipeline::builder()
        .worker(MultiHash::new())
        .stage(Combine::new())
        .digests(Digests::new(
            FnDigest::new("F", |s| s.to_string()),
            FnDigest::new("G", |s| {
                if s.starts_with('3') {
                    panic!("backend crashed on {s}");
                }
                s.to_string()
            }),
        ))
        .build();

    let error = pipeline.execute(vec!["a"]).unwrap_err();

    match error {
        PipelineError::Stage { stage, source } => {
            assert_eq!(stage, "MultiHash");
            assert!(matches!(source, StageError::TaskPanicked { position: 0, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_dataset_combines_to_empty_string() {
    let pipeline = Pipeline::signer(stub_digests());

    let result = pipeline.execute(Vec::<i64>::new()).unwrap();

    assert_eq!(result, "");
}

#[test]
fn pipeline_can_be_reused_after_a_failure() {
    let pipeline = Pipeline::signer(stub_digests());

    assert!(pipeline.execute(vec![Item::from(vec![0xFFu8])]).is_err());
    assert!(pipeline.execute(vec![1]).is_ok());
}

use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ioprof_core::prelude::*;
use ioprof_core::FailurePolicy;
use ioprof_writer::ChromeTraceWriter;
use serde_json::json;

fn enabled_context() -> ProfilingContext {
    ProfilingContext::from_config(&ProfilingConfig {
        enabled: true,
        ..ProfilingConfig::default()
    })
}

fn read_at(path: &str, offset: u64) -> io::Result<usize> {
    if path.is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "empty path"));
    }
    Ok(offset as usize + path.len())
}

#[test]
fn wrapper_records_name_args_kwargs() {
    let ctx = enabled_context();
    let call = CallInfo::new("read_at")
        .arg("log.txt")
        .arg(&8u64)
        .kwarg("whence", "start");

    let out = profiled_result(&ctx, call, || read_at("log.txt", 8)).unwrap();
    assert_eq!(out, 15);

    let profiler = ctx.profiler();
    assert_eq!(profiler.show().len(), 1);
    let args = &profiler.show()[0]["args"];
    assert_eq!(args["name"], "read_at");
    assert_eq!(args["args"], json!(["log.txt", 8]));
    assert_eq!(args["kwargs"], json!({"whence": "start"}));
}

#[test]
fn failing_operation_runs_exit_path() {
    let ctx = enabled_context();

    let err = ioprof_core::try_profile_call!(&ctx, read_at("", 0)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);

    let profiler = ctx.profiler();
    assert!(!profiler.is_recording());
    assert!(profiler.matrix().is_empty());
    assert_eq!(profiler.show()[0]["args"]["exit"], "failed");
}

#[test]
fn skip_failed_policy_drops_failed_calls() {
    let ctx = ProfilingContext::from_config(&ProfilingConfig {
        enabled: true,
        failure_policy: FailurePolicy::SkipFailed,
        ..ProfilingConfig::default()
    });

    let _ = ioprof_core::try_profile_call!(&ctx, read_at("", 0));
    let _ = ioprof_core::try_profile_call!(&ctx, read_at("a", 1));

    let profiler = ctx.profiler();
    assert_eq!(profiler.show().len(), 1);
    assert_eq!(profiler.show()[0]["args"]["exit"], "completed");
}

#[test]
fn panic_propagates_after_exit_path() {
    let ctx = enabled_context();

    let result = catch_unwind(AssertUnwindSafe(|| {
        profiled(&ctx, CallInfo::new("mmap"), || -> usize { panic!("bad mapping") })
    }));
    assert!(result.is_err());

    let profiler = ctx.profiler();
    assert!(!profiler.is_recording());
    assert_eq!(profiler.show()[0]["args"]["exit"], "unwound");
}

#[test]
fn nested_call_keeps_outer_entry_intact() {
    let ctx = enabled_context();

    let total = profiled(&ctx, CallInfo::new("copy").arg("a").arg("b"), || {
        let read = profiled(&ctx, CallInfo::new("read").arg("a"), || 10);
        read + 1
    });
    assert_eq!(total, 11);

    let profiler = ctx.profiler();
    assert_eq!(profiler.show().len(), 1);
    assert_eq!(profiler.show()[0]["name"], "copy");
    assert_eq!(profiler.show()[0]["args"]["args"], json!(["a", "b"]));
}

#[test]
fn concurrent_calls_never_corrupt_sessions() {
    let ctx = Arc::new(enabled_context());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                for _ in 0..25 {
                    profiled(&ctx, CallInfo::new("write").arg(&i), || {
                        thread::sleep(Duration::from_micros(50))
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let profiler = ctx.profiler();
    assert!(!profiler.is_recording());
    assert!(!profiler.show().is_empty());
    assert!(profiler.show().len() <= 100);
    for entry in profiler.show() {
        assert_eq!(entry["name"], "write");
        assert_eq!(entry["args"]["exit"], "completed");
        assert!(entry["dur"].as_f64().unwrap() >= 0.0);
    }
}

#[test]
fn injected_profiler_receives_calls() {
    let ctx = ProfilingContext::new(
        Box::new(
            TraceProfiler::new(Arc::new(ChromeTraceWriter::new()), ProfilingFlag::default())
                .with_category("disk"),
        ),
        ProfilingFlag::new(true),
    );

    profiled(&ctx, CallInfo::new("fsync"), || ());
    assert_eq!(ctx.profiler().show()[0]["cat"], "disk");
}

#[tokio::test]
async fn async_call_records_completion() {
    let ctx = enabled_context();

    let out = profiled_async(&ctx, CallInfo::new("fetch").kwarg("bytes", &64), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        64usize
    })
    .await;
    assert_eq!(out, 64);

    let profiler = ctx.profiler();
    let entry = &profiler.show()[0];
    assert_eq!(entry["args"]["exit"], "completed");
    assert_eq!(entry["args"]["kwargs"], json!({"bytes": 64}));
    assert!(entry["dur"].as_f64().unwrap() >= 9_000.0);
}

#[tokio::test]
async fn async_result_records_failure() {
    let ctx = enabled_context();

    let out: Result<(), String> =
        profiled_async_result(&ctx, CallInfo::new("upload"), async { Err("reset".to_owned()) })
            .await;
    assert!(out.is_err());
    assert_eq!(ctx.profiler().show()[0]["args"]["exit"], "failed");
}

#[tokio::test]
async fn cancelled_future_records_cancellation() {
    let ctx = enabled_context();

    let slow = profiled_async(&ctx, CallInfo::new("download"), async {
        tokio::time::sleep(Duration::from_secs(5)).await;
    });
    let timed_out = tokio::time::timeout(Duration::from_millis(20), slow).await;
    assert!(timed_out.is_err());

    let profiler = ctx.profiler();
    assert!(!profiler.is_recording());
    assert_eq!(profiler.show().len(), 1);
    assert_eq!(profiler.show()[0]["args"]["exit"], "cancelled");
}

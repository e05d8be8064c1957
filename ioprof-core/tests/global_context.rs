//! The process-wide context is shared by every test in a binary, so this file
//! holds a single test.

use ioprof_core::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn stat(path: &str) -> usize {
    path.len()
}

fn open(path: &str, mode: &str) -> usize {
    path.len() + mode.len()
}

#[test]
fn profiling_guard_and_dump_profile() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("global/trace.json");

    let config = ProfilingConfig {
        output_path: Some(path.clone()),
        ..ProfilingConfig::default()
    };
    let previous = context().set_profiler(Box::new(TraceProfiler::from_config(
        &config,
        context().flag().clone(),
    )));
    assert_eq!(previous.name(), "TraceProfiler");
    assert!(!context().is_profiling());

    // disabled: nothing recorded
    assert_eq!(ioprof_core::profile_call!(stat("skipped")), 7);
    assert!(context().profiler().show().is_empty());

    {
        let _on = profiling();
        assert!(context().is_profiling());
        assert_eq!(ioprof_core::profile_call!(open("a.txt"; mode = "r")), 6);
        assert_eq!(profile(CallInfo::new("stat").arg("b"), || stat("b")), 1);
    }
    assert!(!context().is_profiling());

    dump_profile().unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let events = doc["traceEvents"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["args"]["args"], serde_json::json!(["a.txt"]));
    assert_eq!(events[0]["args"]["kwargs"]["mode"], "r");
    assert_eq!(events[1]["args"]["args"], serde_json::json!(["b"]));
}

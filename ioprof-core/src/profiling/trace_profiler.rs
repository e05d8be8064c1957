//! Chrome trace profiler.
//!
//! Records every profiled call as a Chrome Trace "complete" event (`ph: "X"`)
//! that can be inspected in `chrome://tracing` or <https://ui.perfetto.dev>.
//!
//! ## Entry schema
//!
//! | key    | value                                                  |
//! |--------|--------------------------------------------------------|
//! | `name` | the staged `"name"` attribute, or the profiler name    |
//! | `cat`  | configured category (default `"io"`)                   |
//! | `ph`   | event type, `"X"` by default                           |
//! | `ts`   | session start, microseconds since the Unix epoch       |
//! | `dur`  | session length in microseconds, from a monotonic clock |
//! | `pid`  | OS process id                                          |
//! | `tid`  | stable logical id of the recording thread              |
//! | `args` | every staged attribute, plus `"exit"`                  |

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use compact_str::CompactString;
use ioprof_writer::{ProfileEntry, ProfileWriter};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::context::ProfilingFlag;
use super::profiler::{Profiler, ProfilerState, ScopeExit, now_seconds};
use crate::config::{FailurePolicy, ProfilingConfig};
use crate::error::{ProfilerError, ProfilerResult};

const PROFILER_NAME: &str = "TraceProfiler";
const MICROS_PER_SECOND: f64 = 1_000_000.0;

static NEXT_TID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static TID: u64 = NEXT_TID.fetch_add(1, Ordering::Relaxed);
}

fn tid() -> u64 {
    TID.with(|t| *t)
}

pub struct TraceProfiler {
    state: ProfilerState,
    output_path: Option<PathBuf>,
    category: CompactString,
    failure_policy: FailurePolicy,
    slow_call_threshold: Option<Duration>,
    started_at: Option<Instant>,
}

impl TraceProfiler {
    pub fn new(writer: Arc<dyn ProfileWriter>, flag: ProfilingFlag) -> Self {
        Self {
            state: ProfilerState::new(writer, flag),
            output_path: None,
            category: CompactString::const_new("io"),
            failure_policy: FailurePolicy::Record,
            slow_call_threshold: None,
            started_at: None,
        }
    }

    pub fn from_config(config: &ProfilingConfig, flag: ProfilingFlag) -> Self {
        Self::new(config.writer(), flag)
            .with_output_path(config.output_path())
            .with_category(config.category.clone())
            .with_failure_policy(config.failure_policy)
            .with_slow_call_threshold(config.slow_call_threshold)
    }

    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<CompactString>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_slow_call_threshold(mut self, threshold: Option<Duration>) -> Self {
        self.slow_call_threshold = threshold;
        self
    }

    fn should_record(&self, exit: ScopeExit) -> bool {
        match self.failure_policy {
            FailurePolicy::Record => true,
            FailurePolicy::SkipFailed => exit.is_success(),
        }
    }

    fn event_name(&self) -> String {
        self.matrix()
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(PROFILER_NAME)
            .to_owned()
    }

    fn warn_if_slow(&self) {
        if let Some(threshold) = self.slow_call_threshold
            && self.state.has_complete_session()
            && self.recorded_time() >= threshold.as_secs_f64()
        {
            warn!(
                "Slow profiled call {}: {:.3}ms (threshold {}ms)",
                self.event_name(),
                self.recorded_time() * 1_000.0,
                threshold.as_millis()
            );
        }
    }
}

impl Profiler for TraceProfiler {
    fn name(&self) -> &str {
        PROFILER_NAME
    }

    fn state(&self) -> &ProfilerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProfilerState {
        &mut self.state
    }

    fn start_recording(&mut self) -> ProfilerResult<()> {
        self.state.mark_start(PROFILER_NAME, now_seconds())?;
        self.started_at = Some(Instant::now());
        Ok(())
    }

    /// The end time is the start time plus the monotonic elapsed time, so
    /// a wall-clock step cannot make it precede the start.
    fn stop_recording(&mut self) {
        let end = match self.started_at {
            Some(started) if self.state.start_time() >= 0.0 => {
                self.state.start_time() + started.elapsed().as_secs_f64()
            }
            _ => now_seconds(),
        };
        self.state.mark_stop(end);
    }

    /// `ts` is in microseconds; `0.0` means "session start"
    fn generate_profile_dict(&self, ts: f64, event_type: &str) -> ProfileEntry {
        let ts_us = if ts > 0.0 {
            ts
        } else if self.state.start_time() >= 0.0 {
            self.state.start_time() * MICROS_PER_SECOND
        } else {
            now_seconds() * MICROS_PER_SECOND
        };

        let dur_us = if self.state.has_complete_session() {
            self.recorded_time() * MICROS_PER_SECOND
        } else {
            0.0
        };

        let args: Map<String, Value> = self
            .matrix()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut entry = ProfileEntry::with_capacity(8);
        entry.insert("name".into(), json!(self.event_name()));
        entry.insert("cat".into(), json!(self.category.as_str()));
        entry.insert("ph".into(), json!(event_type));
        entry.insert("ts".into(), json!(ts_us));
        entry.insert("dur".into(), json!(dur_us));
        entry.insert("pid".into(), json!(std::process::id()));
        entry.insert("tid".into(), json!(tid()));
        entry.insert("args".into(), Value::Object(args));
        entry
    }

    fn profile_file_path(&self) -> Option<PathBuf> {
        self.output_path.clone()
    }

    fn dump(&self, path: Option<&Path>) -> ProfilerResult<()> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| self.profile_file_path())
            .ok_or(ProfilerError::NoProfilePath)?;

        self.state.write_entries(&path)?;
        debug!(
            "Wrote {} trace events to {}",
            self.show().len(),
            path.display()
        );
        Ok(())
    }

    /// Stops the session, saves the entry per the failure policy and resets
    /// the session state for the next call.
    fn on_scope_exit(&mut self, exit: ScopeExit) {
        self.stop_recording();
        self.warn_if_slow();

        if self.should_record(exit) {
            self.add_matrix("exit", json!(exit.as_str()));
            self.save_profile(None);
        } else {
            debug!(
                "Skipping {} entry for {}",
                exit.as_str(),
                self.event_name()
            );
        }

        self.reset();
    }
}

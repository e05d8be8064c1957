//! The profiler abstraction: timing state, the attribute map ("matrix") and
//! the list of finalized entries.
//!
//! Variant-specific behaviour (how timestamps are taken, what an entry looks
//! like, where it is persisted, what happens on scope exit) lives in the
//! required methods of [`Profiler`]. The bookkeeping every variant shares is
//! provided by the trait itself on top of [`ProfilerState`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use ioprof_writer::{ProfileEntry, ProfileWriter};
use serde_json::Value;
use tracing::warn;

use super::context::ProfilingFlag;
use crate::error::{ProfilerError, ProfilerResult};

/// Chrome trace phase code for a complete (begin + duration) event
pub const COMPLETE_EVENT: &str = "X";

/// Sentinel for a timestamp that has not been taken
pub const UNSET_TIME: f64 = -1.0;

/// Attribute map staged into the next finalized entry
pub type Matrix = IndexMap<String, Value>;

/// Wall-clock time in seconds since the Unix epoch
pub fn now_seconds() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1_000_000_000.0
}

/// How a protected block ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeExit {
    /// Returned normally
    Completed,

    /// Returned an error value
    Failed,

    /// Unwound by a panic
    Unwound,

    /// A future was dropped before it completed
    Cancelled,
}

impl ScopeExit {
    pub const fn as_str(self) -> &'static str {
        match self {
            ScopeExit::Completed => "completed",
            ScopeExit::Failed => "failed",
            ScopeExit::Unwound => "unwound",
            ScopeExit::Cancelled => "cancelled",
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, ScopeExit::Completed)
    }
}

/// State shared by every profiler variant.
///
/// Entries can only be appended through [`Profiler::save_profile`] and
/// discarded through [`Profiler::clean`].
pub struct ProfilerState {
    start_time: f64,
    end_time: f64,
    matrix: Matrix,
    entries: Vec<ProfileEntry>,
    flag: ProfilingFlag,
    writer: Arc<dyn ProfileWriter>,
}

impl ProfilerState {
    pub fn new(writer: Arc<dyn ProfileWriter>, flag: ProfilingFlag) -> Self {
        Self {
            start_time: UNSET_TIME,
            end_time: UNSET_TIME,
            matrix: Matrix::new(),
            entries: Vec::new(),
            flag,
            writer,
        }
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// A session is open: started and not yet stopped
    pub fn is_recording(&self) -> bool {
        self.start_time >= 0.0 && self.end_time < 0.0
    }

    /// Both bounds were taken, so `recorded_time` is meaningful
    pub fn has_complete_session(&self) -> bool {
        self.start_time >= 0.0 && self.end_time >= self.start_time
    }

    /// Open a session at `now`. Clears a previous end time so the
    /// `end >= start` invariant holds once the session is stopped.
    pub fn mark_start(&mut self, profiler: &str, now: f64) -> ProfilerResult<()> {
        if self.is_recording() {
            return Err(ProfilerError::already_recording(profiler));
        }
        self.start_time = now;
        self.end_time = UNSET_TIME;
        Ok(())
    }

    /// Close the session at `now`. Valid without a preceding start.
    pub fn mark_stop(&mut self, now: f64) {
        self.end_time = now;
    }

    pub fn flag(&self) -> &ProfilingFlag {
        &self.flag
    }

    /// Persist the accumulated entries through the injected writer. A
    /// transient failure is retried once.
    pub fn write_entries(&self, path: &Path) -> ProfilerResult<()> {
        match self.writer.write(path, &self.entries) {
            Err(e) if e.should_retry() => {
                warn!(retry = true, "Retrying write to {}: {}", path.display(), e);
                self.writer.write(path, &self.entries)?;
                Ok(())
            }
            result => result.map_err(ProfilerError::from),
        }
    }

    pub(crate) fn bind_flag(&mut self, flag: ProfilingFlag) {
        self.flag = flag;
    }
}

/// A stateful entity that times operations and accumulates structured records.
///
/// One recording session at a time: `Idle --start--> Recording --stop--> Idle`.
pub trait Profiler: Send {
    /// Label of the profiler variant
    fn name(&self) -> &str;

    fn state(&self) -> &ProfilerState;

    fn state_mut(&mut self) -> &mut ProfilerState;

    /// Open a session. Fails with [`ProfilerError::AlreadyRecording`] while
    /// one is open.
    fn start_recording(&mut self) -> ProfilerResult<()>;

    /// Close the session. Must not fail, even without a matching start.
    fn stop_recording(&mut self);

    /// Build one entry from the current state
    fn generate_profile_dict(&self, ts: f64, event_type: &str) -> ProfileEntry;

    /// Default persistence target, if this variant persists to a file
    fn profile_file_path(&self) -> Option<PathBuf>;

    /// Persist entries to `path`, or to [`Profiler::profile_file_path`]
    fn dump(&self, path: Option<&Path>) -> ProfilerResult<()>;

    /// Runs on every exit of a scope. Must at least stop the recording.
    fn on_scope_exit(&mut self, exit: ScopeExit);

    /// `end_time - start_time`; meaningless unless both were set by a
    /// matched start/stop pair.
    fn recorded_time(&self) -> f64 {
        let state = self.state();
        state.end_time - state.start_time
    }

    fn is_recording(&self) -> bool {
        self.state().is_recording()
    }

    /// Upsert one attribute; last write wins
    fn add_matrix(&mut self, key: &str, value: Value) {
        self.state_mut().matrix.insert(key.to_owned(), value);
    }

    fn matrix(&self) -> &Matrix {
        &self.state().matrix
    }

    fn reset_matrix(&mut self) {
        self.state_mut().matrix.clear();
    }

    /// Timestamps back to the sentinel and matrix cleared; entries are kept
    fn reset(&mut self) {
        let state = self.state_mut();
        state.start_time = UNSET_TIME;
        state.end_time = UNSET_TIME;
        state.matrix.clear();
    }

    /// [`Profiler::reset`] plus discarding every recorded entry
    fn clean(&mut self) {
        self.reset();
        self.state_mut().entries.clear();
    }

    /// Append one entry, unless profiling is disabled.
    ///
    /// Without `external` the entry comes from
    /// [`Profiler::generate_profile_dict`]. With it, the matrix is merged
    /// over `external` and matrix values win on key collisions.
    fn save_profile(&mut self, external: Option<ProfileEntry>) {
        if !self.state().flag.is_enabled() {
            return;
        }

        let entry = match external {
            None => self.generate_profile_dict(0.0, COMPLETE_EVENT),
            Some(mut entry) => {
                for (key, value) in &self.state().matrix {
                    entry.insert(key.clone(), value.clone());
                }
                entry
            }
        };
        self.state_mut().entries.push(entry);
    }

    /// Entries in the order they were saved
    fn show(&self) -> &[ProfileEntry] {
        &self.state().entries
    }
}

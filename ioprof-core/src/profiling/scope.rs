//! RAII scopes around a recording session.
//!
//! Entering a scope starts recording; dropping it hands the outcome to
//! [`Profiler::on_scope_exit`]. Drop runs on normal return, early return,
//! panic unwinding and future cancellation alike.

use compact_str::CompactString;
use tracing::{debug, warn};

use super::context::ProfilingContext;
use super::instrument::CallInfo;
use super::profiler::{Profiler, ScopeExit};
use crate::error::ProfilerResult;

/// `Unwound` only for a panic that started after the scope was entered;
/// a scope opened inside a `Drop` during unwinding reports its own outcome.
fn resolve_exit(recorded: ScopeExit, entered_while_panicking: bool) -> ScopeExit {
    if std::thread::panicking() && !entered_while_panicking {
        ScopeExit::Unwound
    } else {
        recorded
    }
}

/// Scope over a profiler the caller owns or has borrowed exclusively
pub struct ProfileScope<'a> {
    profiler: &'a mut dyn Profiler,
    exit: ScopeExit,
    entered_while_panicking: bool,
}

impl<'a> ProfileScope<'a> {
    pub fn enter(profiler: &'a mut dyn Profiler) -> ProfilerResult<Self> {
        profiler.start_recording()?;
        debug!("Entering profile scope on {}", profiler.name());
        Ok(Self {
            profiler,
            exit: ScopeExit::Completed,
            entered_while_panicking: std::thread::panicking(),
        })
    }

    /// Outcome reported on drop, unless a panic unwinds through the scope
    pub fn set_exit(&mut self, exit: ScopeExit) {
        self.exit = exit;
    }

    /// The profiler, e.g. to stage more attributes while the session is open
    pub fn profiler(&mut self) -> &mut dyn Profiler {
        &mut *self.profiler
    }
}

impl Drop for ProfileScope<'_> {
    fn drop(&mut self) {
        let exit = resolve_exit(self.exit, self.entered_while_panicking);
        self.profiler.on_scope_exit(exit);
        debug!(
            "Exiting profile scope on {} ({})",
            self.profiler.name(),
            exit.as_str()
        );
    }
}

/// Scope over the profiler of a [`ProfilingContext`].
///
/// The context lock is taken on enter and on drop only, never while the
/// protected operation runs.
pub struct ContextScope<'a> {
    ctx: &'a ProfilingContext,
    call: CompactString,
    exit: ScopeExit,
    entered_while_panicking: bool,
}

impl<'a> ContextScope<'a> {
    /// Stage `call` and open a session. Returns `None` when the call has to
    /// run unprofiled: a session is already open (nested or concurrent call)
    /// or the profiler refused to start.
    pub fn enter(ctx: &'a ProfilingContext, call: &CallInfo) -> Option<Self> {
        ctx.with_profiler(|profiler| {
            if profiler.is_recording() {
                debug!(
                    "{} is already recording, running {} unprofiled",
                    profiler.name(),
                    call.name()
                );
                return None;
            }

            call.stage(profiler);
            if let Err(e) = profiler.start_recording() {
                warn!("Failed to start recording {}: {}", call.name(), e);
                profiler.reset_matrix();
                return None;
            }

            debug!("Entering profile scope: {}", call.name());
            Some(Self {
                ctx,
                call: CompactString::new(call.name()),
                exit: ScopeExit::Completed,
                entered_while_panicking: std::thread::panicking(),
            })
        })
    }

    pub fn set_exit(&mut self, exit: ScopeExit) {
        self.exit = exit;
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        let exit = resolve_exit(self.exit, self.entered_while_panicking);
        self.ctx.with_profiler(|profiler| profiler.on_scope_exit(exit));
        debug!("Exiting profile scope: {} ({})", self.call, exit.as_str());
    }
}

//! Profiling context: the "profiling enabled" flag and the active profiler.
//!
//! A [`ProfilingContext`] can be built and injected explicitly
//! (`ProfilingContext::from_config`). For call sites that cannot thread one
//! through, a single process-wide instance is available through [`context()`]:
//!
//! - **init**: created lazily on first access, from
//!   `ProfilingConfig::default()` (flag disabled, default `TraceProfiler`)
//! - **read**: any thread, through `context()`
//! - **mutate**: the flag through [`ProfilingFlag::set`] or the scoped
//!   [`profiling()`] guard; the profiler through
//!   [`ProfilingContext::set_profiler`]
//! - **teardown**: `set_profiler` hands back the previous profiler, which is
//!   dropped by the caller once its entries have been dumped

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::profiler::Profiler;
use super::trace_profiler::TraceProfiler;
use crate::config::ProfilingConfig;
use crate::error::ProfilerResult;

/// Shared on/off switch read by `save_profile`
#[derive(Debug, Clone, Default)]
pub struct ProfilingFlag(Arc<AtomicBool>);

impl ProfilingFlag {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Returns the previous value
    pub fn set(&self, enabled: bool) -> bool {
        self.0.swap(enabled, Ordering::AcqRel)
    }

    /// Set the flag until the guard is dropped, then restore the previous value
    #[must_use = "the flag is restored as soon as the guard is dropped"]
    pub fn scoped(&self, enabled: bool) -> FlagGuard {
        let previous = self.set(enabled);
        FlagGuard {
            flag: self.clone(),
            previous,
        }
    }

    #[must_use = "the flag is restored as soon as the guard is dropped"]
    pub fn enable_scoped(&self) -> FlagGuard {
        self.scoped(true)
    }

    /// Both handles control the same switch
    pub fn same_as(&self, other: &ProfilingFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Restores a [`ProfilingFlag`] on drop
pub struct FlagGuard {
    flag: ProfilingFlag,
    previous: bool,
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// The flag plus exactly one live profiler
pub struct ProfilingContext {
    flag: ProfilingFlag,
    profiler: Mutex<Box<dyn Profiler>>,
}

impl ProfilingContext {
    /// Build a context around `profiler`. The profiler is rebound to `flag`
    /// so `save_profile` always reads this context's switch.
    pub fn new(mut profiler: Box<dyn Profiler>, flag: ProfilingFlag) -> Self {
        profiler.state_mut().bind_flag(flag.clone());
        Self {
            flag,
            profiler: Mutex::new(profiler),
        }
    }

    pub fn from_config(config: &ProfilingConfig) -> Self {
        let flag = ProfilingFlag::new(config.enabled);
        let profiler = TraceProfiler::from_config(config, flag.clone());
        Self::new(Box::new(profiler), flag)
    }

    pub fn flag(&self) -> &ProfilingFlag {
        &self.flag
    }

    pub fn is_profiling(&self) -> bool {
        self.flag.is_enabled()
    }

    /// Lock the active profiler. Do not hold the guard across a profiled call.
    pub fn profiler(&self) -> MutexGuard<'_, Box<dyn Profiler>> {
        self.profiler.lock()
    }

    pub fn with_profiler<R>(&self, f: impl FnOnce(&mut dyn Profiler) -> R) -> R {
        let mut profiler = self.profiler.lock();
        f(&mut **profiler)
    }

    /// Install a new profiler and return the previous one
    pub fn set_profiler(&self, mut profiler: Box<dyn Profiler>) -> Box<dyn Profiler> {
        profiler.state_mut().bind_flag(self.flag.clone());
        let previous = std::mem::replace(&mut *self.profiler.lock(), profiler);
        debug!("Replaced active profiler {}", previous.name());
        previous
    }

    /// Persist the active profiler's entries
    pub fn dump(&self, path: Option<&Path>) -> ProfilerResult<()> {
        let profiler = self.profiler.lock();
        profiler.dump(path)?;
        info!(
            "Dumped {} profile entries from {}",
            profiler.show().len(),
            profiler.name()
        );
        Ok(())
    }
}

impl Default for ProfilingContext {
    fn default() -> Self {
        Self::from_config(&ProfilingConfig::default())
    }
}

static CONTEXT: Lazy<ProfilingContext> = Lazy::new(ProfilingContext::default);

/// The process-wide profiling context
pub fn context() -> &'static ProfilingContext {
    &CONTEXT
}

/// Enable process-wide profiling until the returned guard is dropped
#[must_use = "profiling is disabled again as soon as the guard is dropped"]
pub fn profiling() -> FlagGuard {
    context().flag().enable_scoped()
}

/// Persist the process-wide profiler's entries to its default path
pub fn dump_profile() -> ProfilerResult<()> {
    context().dump(None)
}

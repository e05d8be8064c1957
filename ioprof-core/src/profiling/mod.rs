//! Profilers, the profiling context and call instrumentation

pub mod context;
pub mod instrument;
pub mod macros;
pub mod profiler;
pub mod scope;
pub mod trace_profiler;

pub use context::{FlagGuard, ProfilingContext, ProfilingFlag, context, dump_profile, profiling};
pub use instrument::{
    CallInfo, UNSERIALIZABLE, profile, profiled, profiled_async, profiled_async_result,
    profiled_result,
};
pub use profiler::{COMPLETE_EVENT, Matrix, Profiler, ProfilerState, ScopeExit, UNSET_TIME};
pub use scope::{ContextScope, ProfileScope};
pub use trace_profiler::TraceProfiler;

//! # ioprof-core - I/O Call Profiler
//!
//! Times I/O calls and accumulates one structured entry per call, written out
//! as a Chrome trace or as JSON lines.
//!
//! ```rust,ignore
//! use ioprof_core::prelude::*;
//!
//! let _on = profiling();
//! let data = profile(CallInfo::new("read").arg("data.bin"), || std::fs::read("data.bin"));
//! dump_profile()?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod profiling;

pub use config::{FailurePolicy, ProfilingConfig};
pub use error::{ProfilerError, ProfilerResult};
pub use logging::{LoggerBuilder, LoggerConfig};
pub use profiling::{context, dump_profile, profiling};

pub use ioprof_writer::{
    ChromeTraceWriter, ExportFormat, JsonLinesWriter, ProfileEntry, ProfileWriter, WriterError,
};

pub mod prelude {
    pub use crate::profiling::{
        CallInfo, ContextScope, ProfileScope, Profiler, ProfilingContext, ProfilingFlag,
        ScopeExit, TraceProfiler, context, dump_profile, profile, profiled, profiled_async,
        profiled_async_result, profiled_result, profiling,
    };
    pub use crate::{ProfilerError, ProfilerResult, ProfilingConfig, profile_call, try_profile_call};
}

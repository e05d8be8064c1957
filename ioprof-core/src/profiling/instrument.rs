//! Wrappers that profile a single call.
//!
//! Each wrapper stages `"name"`, `"args"` and `"kwargs"` into the context's
//! profiler, runs the operation inside a [`ContextScope`] and returns exactly
//! what the operation returned. Panics propagate after the exit path ran.

use std::future::Future;

use compact_str::CompactString;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::warn;

use super::context::{ProfilingContext, context};
use super::profiler::{Profiler, ScopeExit};
use super::scope::ContextScope;

/// Recorded in place of an argument that cannot be represented as JSON
pub const UNSERIALIZABLE: &str = "<unserializable>";

/// Name and arguments of one profiled call
#[derive(Debug, Clone, Default)]
pub struct CallInfo {
    name: CompactString,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
}

impl CallInfo {
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    /// Append a positional argument
    #[must_use]
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        let value = capture(&self.name, value);
        self.args.push(value);
        self
    }

    /// Add a named argument; a repeated key keeps the last value
    #[must_use]
    pub fn kwarg<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        let value = capture(&self.name, value);
        self.kwargs.insert(key.to_owned(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &Map<String, Value> {
        &self.kwargs
    }

    pub(crate) fn stage(&self, profiler: &mut dyn Profiler) {
        profiler.add_matrix("name", json!(self.name.as_str()));
        profiler.add_matrix("args", Value::Array(self.args.clone()));
        profiler.add_matrix("kwargs", Value::Object(self.kwargs.clone()));
    }
}

fn capture<T: Serialize + ?Sized>(call: &str, value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!("Argument of {} is not serializable: {}", call, e);
        Value::String(UNSERIALIZABLE.to_owned())
    })
}

/// Profile a synchronous call
pub fn profiled<R>(ctx: &ProfilingContext, call: CallInfo, op: impl FnOnce() -> R) -> R {
    let _scope = ContextScope::enter(ctx, &call);
    op()
}

/// Profile a fallible call; `Err` is reported as [`ScopeExit::Failed`]
pub fn profiled_result<T, E>(
    ctx: &ProfilingContext,
    call: CallInfo,
    op: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let mut scope = ContextScope::enter(ctx, &call);
    let result = op();
    if result.is_err()
        && let Some(scope) = scope.as_mut()
    {
        scope.set_exit(ScopeExit::Failed);
    }
    result
}

/// Profile a future. The session opens on first poll; dropping the future
/// before it completes reports [`ScopeExit::Cancelled`].
pub async fn profiled_async<F: Future>(
    ctx: &ProfilingContext,
    call: CallInfo,
    fut: F,
) -> F::Output {
    let mut scope = ContextScope::enter(ctx, &call);
    if let Some(scope) = scope.as_mut() {
        scope.set_exit(ScopeExit::Cancelled);
    }

    let output = fut.await;

    if let Some(scope) = scope.as_mut() {
        scope.set_exit(ScopeExit::Completed);
    }
    output
}

/// [`profiled_async`] for futures resolving to a `Result`
pub async fn profiled_async_result<T, E, F>(
    ctx: &ProfilingContext,
    call: CallInfo,
    fut: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let mut scope = ContextScope::enter(ctx, &call);
    if let Some(scope) = scope.as_mut() {
        scope.set_exit(ScopeExit::Cancelled);
    }

    let output = fut.await;

    if let Some(scope) = scope.as_mut() {
        scope.set_exit(if output.is_ok() {
            ScopeExit::Completed
        } else {
            ScopeExit::Failed
        });
    }
    output
}

/// [`profiled`] against the process-wide context
pub fn profile<R>(call: CallInfo, op: impl FnOnce() -> R) -> R {
    profiled(context(), call, op)
}

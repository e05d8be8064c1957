//! Call-site instrumentation macros.
//!
//! `profile_call!(ctx, read(path, len; mode = "rb"))` records
//! `name = "read"`, `args = [path, len]` and `kwargs = {"mode": "rb"}`, then
//! calls `read(path, len, "rb")`. Named arguments are passed positionally
//! after the unnamed ones. Every argument is evaluated exactly once, before
//! the call. Omitting the context uses the process-wide one.
//!
//! The recorded name is the last path segment: `fsops::stat(p)` is recorded
//! as `"stat"`. Method calls on a local are accepted too:
//! `profile_call!(ctx, disk.read(p))` records `"read"` and leaves the
//! receiver out of `args`.

/// Profile a function or method call through
/// [`profiled`](crate::profiling::profiled)
#[macro_export]
macro_rules! profile_call {
    ($($call:tt)*) => {
        $crate::__profile_call!(@entry profiled $($call)*)
    };
}

/// Like [`profile_call!`], but an `Err` result is recorded as a failed call
#[macro_export]
macro_rules! try_profile_call {
    ($($call:tt)*) => {
        $crate::__profile_call!(@entry profiled_result $($call)*)
    };
}

/// Binds each argument to its own local, one step per argument, then hands
/// the bound names to the runner.
#[doc(hidden)]
#[macro_export]
macro_rules! __profile_call {
    // call shapes
    (@entry $runner:ident $($func:ident)::+ ( $($args:tt)* )) => {
        $crate::__profile_call!(
            @pos [[$crate::context()] [$($func)::+] [$($func)::+] $runner] [] $($args)*
        )
    };
    (@entry $runner:ident $recv:ident . $method:ident ( $($args:tt)* )) => {
        $crate::__profile_call!(
            @pos [[$crate::context()] [$method] [$recv . $method] $runner] [] $($args)*
        )
    };
    (@entry $runner:ident $ctx:expr, $($func:ident)::+ ( $($args:tt)* )) => {
        $crate::__profile_call!(
            @pos [[$ctx] [$($func)::+] [$($func)::+] $runner] [] $($args)*
        )
    };
    (@entry $runner:ident $ctx:expr, $recv:ident . $method:ident ( $($args:tt)* )) => {
        $crate::__profile_call!(
            @pos [[$ctx] [$method] [$recv . $method] $runner] [] $($args)*
        )
    };

    // last path segment
    (@last $last:ident) => {
        stringify!($last)
    };
    (@last $head:ident :: $($rest:tt)+) => {
        $crate::__profile_call!(@last $($rest)+)
    };

    // positional arguments
    (@pos $head:tt [$($bound:ident)*]) => {
        $crate::__profile_call!(@call $head [$($bound)*] [])
    };
    (@pos $head:tt [$($bound:ident)*] ; $($rest:tt)*) => {
        $crate::__profile_call!(@kw $head [$($bound)*] [] $($rest)*)
    };
    (@pos $head:tt [$($bound:ident)*] $arg:expr , $($rest:tt)*) => {{
        let arg = $arg;
        $crate::__profile_call!(@pos $head [$($bound)* arg] $($rest)*)
    }};
    (@pos $head:tt [$($bound:ident)*] $arg:expr ; $($rest:tt)*) => {{
        let arg = $arg;
        $crate::__profile_call!(@kw $head [$($bound)* arg] [] $($rest)*)
    }};
    (@pos $head:tt [$($bound:ident)*] $arg:expr) => {{
        let arg = $arg;
        $crate::__profile_call!(@call $head [$($bound)* arg] [])
    }};

    // named arguments
    (@kw $head:tt $bound:tt [$($named:tt)*]) => {
        $crate::__profile_call!(@call $head $bound [$($named)*])
    };
    (@kw $head:tt $bound:tt [$($named:tt)*] $key:ident = $value:expr , $($rest:tt)*) => {{
        let value = $value;
        $crate::__profile_call!(@kw $head $bound [$($named)* ($key value)] $($rest)*)
    }};
    (@kw $head:tt $bound:tt [$($named:tt)*] $key:ident = $value:expr) => {{
        let value = $value;
        $crate::__profile_call!(@call $head $bound [$($named)* ($key value)])
    }};

    (@call [[$ctx:expr] [$($name:tt)*] [$($callee:tt)*] $runner:ident]
        [$($bound:ident)*] [$(($key:ident $value:ident))*]) => {{
        let call = $crate::profiling::CallInfo::new($crate::__profile_call!(@last $($name)*))
            $(.arg(&$bound))*
            $(.kwarg(stringify!($key), &$value))*;
        $crate::profiling::$runner($ctx, call, || $($callee)*($($bound,)* $($value,)*))
    }};
}

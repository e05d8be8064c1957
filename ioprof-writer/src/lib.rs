//! # ioprof-writer - Profile Entry Writers
//!
//! Serializes accumulated profile entries to disk for the `ioprof` profilers.
//!
//! ## Key Features
//! - Chrome Trace Event output (`chrome://tracing`, Perfetto)
//! - JSON Lines output
//! - Crash-safe saves through a temporary file and rename
//! - Clonable, allocation-light error type

pub mod chrome;
pub mod error;
pub mod jsonl;
pub mod persistence;
pub mod writer;

// Re-export main types for easy use
pub use chrome::ChromeTraceWriter;
pub use error::{WriterError, WriterResult};
pub use jsonl::JsonLinesWriter;
pub use writer::{ExportFormat, ProfileEntry, ProfileWriter};

//! Cloudaudit library - chunked audit log export
//!
//! Resolves a time range, splits it into calendar-aligned chunks and writes
//! each chunk's audit logs as a JSON artifact.
pub mod calendar;
pub mod chunk;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod duration;
pub mod error;
pub mod export;
pub mod fetch;
pub mod filter;
pub mod output;
pub mod range;
pub mod signal;

// Re-export commonly used types
pub use chunk::{Chunk, SplitPolicy, split};
pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use export::{ExportSummary, run_export};
pub use filter::FilterCriteria;
pub use range::{RangeSelection, ResolvedRange, TimeWindow, resolve_range};
pub use signal::Interrupt;

//! # Huddle Exec
//!
//! Code execution core for shared coding rooms. A run request is routed
//! either to a remote Judge0-compatible service or to a local engine: the
//! embedded Rhai interpreter for the primary language, or a heuristic line
//! simulator for Python, Java, C++ and C#. Every path ends in one formatted
//! report that is published to the whole room.

mod context;
mod error;
mod primary;
mod report;
mod router;
mod service;
pub mod simulator;
mod types;

#[cfg(test)]
mod tests;

pub use context::{ExecutionContext, Value};
pub use error::Error;
pub use primary::PrimaryEvaluator;
pub use report::{ReportBuilder, EMPTY_CODE, NO_OUTPUT, SUCCESS_MARKER};
pub use router::ExecutionRouter;
pub use service::{ExecutionService, ReportSink};
pub use types::{CorrelationKey, ExecutionRequest, ExecutionResult, Language, StatusKind};

/// Result type for code execution operations
pub type Result<T> = std::result::Result<T, Error>;

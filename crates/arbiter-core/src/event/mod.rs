//! # Arbiter Core Event Reporting
//!
//! Every component of the engine reports what it does as an [`EngineEvent`]
//! through a shared [`Reporter`]. [`LogReporter`] forwards to the `log`
//! facade, [`MemoryReporter`] records events for inspection in tests and
//! [`NullReporter`] drops them.
pub mod reporter;
pub mod types;

use std::sync::Arc;

pub use reporter::{LogReporter, MemoryReporter, NullReporter, Reporter};
pub use types::EngineEvent;

/// Shared handle to a reporter
pub type SharedReporter = Arc<dyn Reporter>;

/// The reporter used when none is supplied
pub fn default_reporter() -> SharedReporter {
    Arc::new(LogReporter)
}

#[cfg(test)]
mod tests;

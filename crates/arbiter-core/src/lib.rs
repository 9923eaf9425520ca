pub mod config;
pub mod event;
pub mod kernel;
pub mod plugin_system;
pub mod utils;

// Re-export the types most callers need
pub use config::{ConfigFormat, EngineConfig};
pub use event::{EngineEvent, Reporter, SharedReporter};
pub use kernel::error::Error as KernelError;
pub use kernel::{Engine, LoadOutcome};
pub use plugin_system::{
    ConflictResolver, DependencyResolver, ErrorHandler, NamespaceAllocator, PluginManifest,
    PluginRegistry, PriorityRegistry, PriorityTier, VersionComparator,
};

#[cfg(test)]
mod tests;

//! # Arbiter Core Plugin System
//!
//! This module decides which plugins load, in what order, and who wins when
//! two plugins claim the same name. It works on a read-only snapshot of
//! plugin manifests and never loads plugin code itself.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`version`]**: Dotted version parsing, comparison and constraint
//!   matching ([`VersionComparator`]).
//! - **[`dependency`]**: Declared dependencies ([`PluginDependency`]) and the
//!   errors raised while resolving them.
//! - **[`manifest`]**: Plugin metadata ([`PluginManifest`]) as read from a
//!   registry snapshot.
//! - **[`registry`]**: The ordered, read-only collection of manifests
//!   ([`PluginRegistry`]).
//! - **[`resolver`]**: Load order computation with cycle detection and
//!   cached results ([`DependencyResolver`]).
//! - **[`strategy`]**: Pluggable resolution policies (conservative,
//!   aggressive, minimal).
//! - **[`priority`]**: Priority tiers and their auto-detection
//!   ([`PriorityRegistry`]).
//! - **[`namespace`]**: Similarity-based naming conflicts and namespace
//!   allocation ([`NamespaceAllocator`]).
//! - **[`conflict`]**: Command, method and namespace conflict detection and
//!   resolution ([`ConflictResolver`]).
//! - **[`error_handler`]**: Failure classification and recovery with retry,
//!   fallback and disable ([`ErrorHandler`]).
//! - **[`error`]**: The typed [`PluginSystemError`](error::PluginSystemError).
pub mod conflict;
pub mod dependency;
pub mod error;
pub mod error_handler;
pub mod manifest;
pub mod namespace;
pub mod priority;
pub mod registry;
pub mod resolver;
pub mod strategy;
pub mod version;

pub use conflict::{ConflictResolver, ConflictStrategy, ConflictType};
pub use dependency::{DependencyError, PluginDependency};
pub use error_handler::{ErrorContext, ErrorHandler, PluginFailure, RecoveryAction};
pub use manifest::PluginManifest;
pub use namespace::NamespaceAllocator;
pub use priority::{PriorityRegistry, PriorityTier};
pub use registry::PluginRegistry;
pub use resolver::{DependencyResolver, ResolveOptions};
pub use strategy::{ResolutionStrategy, StrategyKind};
pub use version::{VersionComparator, VersionConstraint};

#[cfg(test)]
mod tests;

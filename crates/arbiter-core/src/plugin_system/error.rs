//! # Arbiter Core Plugin System Errors
//!
//! Defines error types specific to the plugin system.
//!
//! [`PluginSystemError`] is the umbrella enum for everything that can go wrong
//! while registering plugins, resolving their dependency graph, ranking them
//! or mediating their conflicts. More specific errors live next to the code
//! that raises them ([`DependencyError`], [`VersionError`], [`PluginFailure`])
//! and convert into it with `?`.
// crates/arbiter-core/src/plugin_system/error.rs
use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::error_handler::PluginFailure;
use crate::plugin_system::version::VersionError;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Dependency resolution failed: {0}")]
    DependencyResolution(#[from] DependencyError),

    #[error("Version parsing error: {0}")]
    VersionParsing(#[from] VersionError),

    #[error("Plugin registration error for '{plugin_id}': {message}")]
    RegistrationError {
        plugin_id: String,
        message: String,
    },

    #[error("Invalid strategy: {0}")]
    InvalidStrategy(String),

    #[error("Invalid priority tier: {0}")]
    InvalidTier(String),

    #[error("Plugin '{0}' is disabled")]
    PluginDisabled(String),

    #[error("Plugin failure: {0}")]
    Failure(#[from] PluginFailure),
}

pub type Result<T> = std::result::Result<T, PluginSystemError>;

//! # Arbiter Core Kernel Errors
//!
//! Defines the crate-level [`Error`] that aggregates the errors of every
//! subsystem, and the [`Result`] alias used by the engine façade.
use crate::config::ConfigError;
use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::error_handler::PluginFailure;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed plugin system error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<DependencyError> for Error {
    fn from(err: DependencyError) -> Self {
        Error::PluginSystem(PluginSystemError::DependencyResolution(err))
    }
}

impl From<PluginFailure> for Error {
    fn from(failure: PluginFailure) -> Self {
        Error::PluginSystem(PluginSystemError::Failure(failure))
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

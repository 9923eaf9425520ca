//! # Arbiter Core Configuration
//!
//! Loads [`EngineConfig`] from JSON, YAML (`yaml-config` feature) or TOML
//! (`toml-config` feature) documents. Configuration is read-only: the engine
//! never writes it back.
pub mod error;
pub mod format;
pub mod settings;

pub use error::ConfigError;
pub use format::ConfigFormat;
pub use settings::EngineConfig;

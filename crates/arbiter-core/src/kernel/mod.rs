//! # Arbiter Core Kernel
//!
//! The `kernel` module ties the engine together. It provides the
//! [`Engine`](engine::Engine) façade that owns a registry snapshot, a
//! configuration and one instance of each plugin-system component, along
//! with the crate-wide constants and the aggregated [`Error`](error::Error)
//! type.
pub mod constants;
pub mod engine;
pub mod error;

pub use engine::{Engine, LoadOutcome};
pub use error::{Error, Result};

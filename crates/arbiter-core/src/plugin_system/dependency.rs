use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plugin_system::version::{VersionComparator, VersionConstraint, VersionError};

/// Represents a dependency on another plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDependency {
    /// The name of the required plugin
    #[serde(rename = "name")]
    pub plugin_name: String,

    /// The version constraint that is acceptable, `None` means any version
    #[serde(rename = "version", default, skip_serializing_if = "Option::is_none")]
    pub version_range: Option<VersionConstraint>,

    /// Whether this is a hard requirement or optional dependency
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// Error that can occur when resolving dependencies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    /// The requested root plugin is not registered
    #[error("Plugin '{0}' not found in registry")]
    PluginNotFound(String),

    /// Dependency cycle detected, listed in edge order and closed on itself
    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Some plugins in the load order are not registered
    #[error("Plugin '{plugin}' has unresolved dependencies: {}", .missing.join(", "))]
    UnresolvedDependency { plugin: String, missing: Vec<String> },

    /// A registered dependency does not satisfy the requirer's constraint
    #[error("Version conflict: '{plugin}' requires {dependency} {required}, but {available} is available")]
    VersionConflict {
        plugin: String,
        dependency: String,
        required: String,
        available: String,
    },

    /// A version or constraint could not be parsed
    #[error(transparent)]
    Version(#[from] VersionError),
}

impl PluginDependency {
    /// Create a new required dependency with a specific version constraint
    pub fn required(plugin_name: &str, version_range: impl Into<VersionConstraint>) -> Self {
        Self {
            plugin_name: plugin_name.to_string(),
            version_range: Some(version_range.into()),
            required: true,
        }
    }

    /// Create a new required dependency with any version
    pub fn required_any(plugin_name: &str) -> Self {
        Self {
            plugin_name: plugin_name.to_string(),
            version_range: None,
            required: true,
        }
    }

    /// Create a new optional dependency with a specific version constraint
    pub fn optional(plugin_name: &str, version_range: impl Into<VersionConstraint>) -> Self {
        Self {
            plugin_name: plugin_name.to_string(),
            version_range: Some(version_range.into()),
            required: false,
        }
    }

    /// Create a new optional dependency with any version
    pub fn optional_any(plugin_name: &str) -> Self {
        Self {
            plugin_name: plugin_name.to_string(),
            version_range: None,
            required: false,
        }
    }

    pub fn is_optional(&self) -> bool {
        !self.required
    }

    /// The constraint string, if any
    pub fn constraint(&self) -> Option<&str> {
        self.version_range.as_ref().map(VersionConstraint::as_str)
    }

    /// Check if this dependency is compatible with the given plugin version string
    pub fn is_compatible_with(&self, version: &str) -> Result<bool, VersionError> {
        VersionComparator::satisfies(version, self.constraint())
    }
}

impl fmt::Display for PluginDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requirement_type = if self.required { "Requires" } else { "Optional" };
        match &self.version_range {
            Some(range) => write!(
                f,
                "{} plugin: {} (version: {})",
                requirement_type, self.plugin_name, range
            ),
            None => write!(f, "{} plugin: {} (any version)", requirement_type, self.plugin_name),
        }
    }
}

use std::collections::HashMap;

use log::debug;
use serde::Deserialize;

use crate::config::ConfigFormat;
use crate::kernel::constants::DEFAULT_PLUGIN_VERSION;
use crate::plugin_system::error::{PluginSystemError, Result};
use crate::plugin_system::manifest::PluginManifest;

/// Registry of plugin descriptors.
///
/// Insertion order is preserved; it is the tie-break order for priority
/// sorting and the iteration order of conflict detection.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginManifest>,
    index: HashMap<String, usize>,
}

/// On-disk shape of a registry snapshot.
#[derive(Debug, Deserialize)]
struct RegistrySnapshot {
    #[serde(default)]
    plugins: Vec<PluginManifest>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from manifests, failing on the first duplicate name
    pub fn from_manifests<I>(manifests: I) -> Result<Self>
    where
        I: IntoIterator<Item = PluginManifest>,
    {
        let mut registry = Self::new();
        for manifest in manifests {
            registry.register_plugin(manifest)?;
        }
        Ok(registry)
    }

    /// Parse a `{ plugins = [...] }` snapshot in the given format.
    pub fn from_snapshot(
        content: &str,
        format: ConfigFormat,
    ) -> crate::kernel::error::Result<Self> {
        let snapshot: RegistrySnapshot = format.deserialize(content)?;
        let registry = Self::from_manifests(snapshot.plugins)?;
        debug!("Loaded registry snapshot with {} plugins", registry.len());
        Ok(registry)
    }

    /// Register a plugin
    pub fn register_plugin(&mut self, manifest: PluginManifest) -> Result<()> {
        if manifest.name.is_empty() {
            return Err(PluginSystemError::RegistrationError {
                plugin_id: manifest.name,
                message: "Plugin name must not be empty".to_string(),
            });
        }
        if self.index.contains_key(&manifest.name) {
            return Err(PluginSystemError::RegistrationError {
                plugin_id: manifest.name.clone(),
                message: "Plugin already registered".to_string(),
            });
        }

        debug!("Registering plugin {} v{}", manifest.name, manifest.version);
        self.index.insert(manifest.name.clone(), self.plugins.len());
        self.plugins.push(manifest);
        Ok(())
    }

    /// Unregister a plugin by name
    pub fn unregister_plugin(&mut self, name: &str) -> Result<PluginManifest> {
        let position = self.index.remove(name).ok_or_else(|| {
            PluginSystemError::RegistrationError {
                plugin_id: name.to_string(),
                message: "Plugin not found".to_string(),
            }
        })?;

        let removed = self.plugins.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Ok(removed)
    }

    /// Check if a plugin is registered
    pub fn has_plugin(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get_plugin(&self, name: &str) -> Option<&PluginManifest> {
        self.index.get(name).map(|&i| &self.plugins[i])
    }

    /// Version of a registered plugin, `"0.0.0"` when it declares none
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.get_plugin(name).map(|m| {
            if m.version.trim().is_empty() {
                DEFAULT_PLUGIN_VERSION
            } else {
                m.version.as_str()
            }
        })
    }

    /// Iterate manifests in registration order
    pub fn iter(&self) -> impl Iterator<Item = &PluginManifest> {
        self.plugins.iter()
    }

    /// Plugin names in registration order
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|m| m.name.clone()).collect()
    }

    /// Registration position, used as the stable tie-break
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}


use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::config::format::ConfigFormat;
use crate::kernel::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_SIMILARITY_THRESHOLD,
};
use crate::plugin_system::conflict::{ConflictStrategy, ConflictType};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::priority::{DetectionRules, PriorityTier};
use crate::plugin_system::strategy::StrategyKind;

/// Engine settings.
///
/// Names (strategies, tiers, conflict types) are kept as written and checked
/// by [`validate`](Self::validate); the typed accessors parse them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Retries before a failing plugin is disabled
    pub max_retries: u32,
    /// Base of the exponential retry backoff
    pub retry_base_delay_ms: u64,
    /// Plugin names more similar than this conflict
    pub similarity_threshold: f64,
    /// Dependency resolution strategy name
    pub strategy: String,
    /// Validate version constraints during strategy-driven resolution
    pub check_versions: bool,
    /// conflict type -> conflict strategy name
    pub conflict_strategies: BTreeMap<String, String>,
    /// plugin -> priority tier name, overrides auto-detection
    pub priorities: BTreeMap<String, String>,
    /// plugin -> fallback plugin
    pub fallbacks: BTreeMap<String, String>,
    pub detection: DetectionRules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            strategy: StrategyKind::default().to_string(),
            check_versions: true,
            conflict_strategies: BTreeMap::new(),
            priorities: BTreeMap::new(),
            fallbacks: BTreeMap::new(),
            detection: DetectionRules::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration document
    pub fn from_str(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: EngineConfig = format.deserialize(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, the format chosen by its extension
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loading {} configuration from {}", format, path.display());
        Self::from_str(&content, format)
    }

    /// Check every named value and numeric range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::invalid(
                "similarity_threshold",
                format!("{} is outside 0.0..=1.0", self.similarity_threshold),
            ));
        }

        self.strategy_kind()?;
        self.conflict_strategy_overrides()?;
        self.priority_overrides()?;

        for (plugin, fallback) in &self.fallbacks {
            if plugin == fallback {
                return Err(ConfigError::invalid(
                    &format!("fallbacks.{}", plugin),
                    "a plugin cannot be its own fallback",
                ));
            }
        }
        Ok(())
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn strategy_kind(&self) -> Result<StrategyKind, ConfigError> {
        self.strategy
            .parse()
            .map_err(|e: PluginSystemError| {
                ConfigError::invalid("strategy", e.to_string())
            })
    }

    pub fn conflict_strategy_overrides(
        &self,
    ) -> Result<Vec<(ConflictType, ConflictStrategy)>, ConfigError> {
        self.conflict_strategies
            .iter()
            .map(|(conflict_type, strategy)| {
                let strategy: ConflictStrategy = strategy.parse().map_err(
                    |e: PluginSystemError| {
                        ConfigError::invalid(
                            &format!("conflict_strategies.{}", conflict_type),
                            e.to_string(),
                        )
                    },
                )?;
                let conflict_type = conflict_type
                    .parse::<ConflictType>()
                    .unwrap_or_else(|never| match never {});
                Ok((conflict_type, strategy))
            })
            .collect()
    }

    pub fn priority_overrides(&self) -> Result<Vec<(String, PriorityTier)>, ConfigError> {
        self.priorities
            .iter()
            .map(|(plugin, tier)| {
                let tier: PriorityTier = tier.parse().map_err(
                    |e: PluginSystemError| {
                        ConfigError::invalid(&format!("priorities.{}", plugin), e.to_string())
                    },
                )?;
                Ok((plugin.clone(), tier))
            })
            .collect()
    }
}

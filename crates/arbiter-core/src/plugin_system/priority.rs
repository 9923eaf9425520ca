use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::kernel::constants::{
    CORE_NAME_MARKER, CORE_PLUGIN_PREFIX, DEVELOPMENT_ENVIRONMENT, OFFICIAL_AUTHOR_MARKER,
    OFFICIAL_REPOSITORY_MARKER, TRUSTED_AUTHORS,
};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::PluginManifest;

/// Precedence class of a plugin. Higher numeric value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    Development,
    Core,
    Official,
    ThirdParty,
    #[default]
    Local,
}

impl PriorityTier {
    /// Every tier, highest first
    pub const ALL: [PriorityTier; 5] = [
        PriorityTier::Development,
        PriorityTier::Core,
        PriorityTier::Official,
        PriorityTier::ThirdParty,
        PriorityTier::Local,
    ];

    pub fn value(&self) -> u8 {
        match self {
            PriorityTier::Development => 100,
            PriorityTier::Core => 90,
            PriorityTier::Official => 70,
            PriorityTier::ThirdParty => 50,
            PriorityTier::Local => 30,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PriorityTier::Development => "Development/debugging plugins with highest priority",
            PriorityTier::Core => "Core plugins built into the system",
            PriorityTier::Official => "Official plugins from the Arbiter ecosystem",
            PriorityTier::ThirdParty => "Third-party plugins from trusted external sources",
            PriorityTier::Local => "Local or user-created plugins with lowest priority",
        }
    }

    /// Two-letter prefix used when namespacing plugin identifiers
    pub fn namespace_prefix(&self) -> &'static str {
        match self {
            PriorityTier::Development => "de",
            PriorityTier::Core => "co",
            PriorityTier::Official => "of",
            PriorityTier::ThirdParty => "th",
            PriorityTier::Local => "lo",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityTier::Development => "development",
            PriorityTier::Core => "core",
            PriorityTier::Official => "official",
            PriorityTier::ThirdParty => "third_party",
            PriorityTier::Local => "local",
        }
    }
}

impl PartialOrd for PriorityTier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityTier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityTier {
    type Err = PluginSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(PriorityTier::Development),
            "core" => Ok(PriorityTier::Core),
            "official" => Ok(PriorityTier::Official),
            "third_party" | "third-party" => Ok(PriorityTier::ThirdParty),
            "local" => Ok(PriorityTier::Local),
            _ => Err(PluginSystemError::InvalidTier(format!(
                "{}. Valid tiers: {}",
                s,
                PriorityTier::ALL
                    .iter()
                    .map(PriorityTier::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Markers used by [`PriorityRegistry::auto_detect`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionRules {
    pub core_prefix: String,
    pub core_name_marker: String,
    pub official_author: String,
    pub official_repository: String,
    pub trusted_authors: Vec<String>,
}

impl Default for DetectionRules {
    fn default() -> Self {
        Self {
            core_prefix: CORE_PLUGIN_PREFIX.to_string(),
            core_name_marker: CORE_NAME_MARKER.to_string(),
            official_author: OFFICIAL_AUTHOR_MARKER.to_string(),
            official_repository: OFFICIAL_REPOSITORY_MARKER.to_string(),
            trusted_authors: TRUSTED_AUTHORS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl DetectionRules {
    fn is_development(&self, manifest: &PluginManifest) -> bool {
        manifest.development
            || manifest.debug
            || manifest.environment.as_deref() == Some(DEVELOPMENT_ENVIRONMENT)
    }

    fn is_official(&self, manifest: &PluginManifest) -> bool {
        contains_marker(&manifest.author, &self.official_author)
            || manifest
                .repository
                .as_deref()
                .is_some_and(|repo| contains_marker(repo, &self.official_repository))
            || manifest.official
    }

    fn is_core(&self, name: &str, manifest: &PluginManifest) -> bool {
        (!self.core_prefix.is_empty() && name.starts_with(&self.core_prefix))
            || contains_marker(&manifest.name, &self.core_name_marker)
    }

    fn is_trusted(&self, manifest: &PluginManifest) -> bool {
        self.trusted_authors
            .iter()
            .any(|author| contains_marker(&manifest.author, author))
    }
}

fn contains_marker(haystack: &str, marker: &str) -> bool {
    !marker.is_empty() && haystack.contains(marker)
}

/// Per-tier section of a [`PriorityReport`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSummary {
    pub tier: PriorityTier,
    pub numeric_value: u8,
    pub description: String,
    pub plugin_count: usize,
    pub plugins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub total_plugins: usize,
    pub tiers: Vec<TierSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityStatistics {
    pub total_plugins: usize,
    pub distribution: BTreeMap<PriorityTier, usize>,
    pub highest_priority: Vec<String>,
    pub lowest_priority: Vec<String>,
}

/// Tracks the priority tier of every known plugin.
///
/// Plugins without an explicit tier are treated as [`PriorityTier::Local`].
#[derive(Debug, Clone, Default)]
pub struct PriorityRegistry {
    priorities: HashMap<String, PriorityTier>,
    /// First-assignment order, keeps listings deterministic
    order: Vec<String>,
    groups: HashMap<PriorityTier, Vec<String>>,
    rules: DetectionRules,
}

impl PriorityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: DetectionRules) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn rules(&self) -> &DetectionRules {
        &self.rules
    }

    /// Assign `tier` to `name`, moving it out of its previous group
    pub fn set_priority(&mut self, name: &str, tier: PriorityTier) {
        match self.priorities.insert(name.to_string(), tier) {
            Some(previous) => {
                if let Some(group) = self.groups.get_mut(&previous) {
                    group.retain(|n| n != name);
                }
            }
            None => self.order.push(name.to_string()),
        }
        self.groups.entry(tier).or_default().push(name.to_string());
        debug!("Plugin {} assigned priority tier {}", name, tier);
    }

    pub fn get_priority(&self, name: &str) -> PriorityTier {
        self.priorities.get(name).copied().unwrap_or_default()
    }

    pub fn priority_value(&self, name: &str) -> u8 {
        self.get_priority(name).value()
    }

    /// Infer a tier from manifest metadata.
    ///
    /// Checked in order: development markers, official markers, core naming,
    /// trusted authors. Anything else is local.
    pub fn auto_detect(&self, name: &str, manifest: &PluginManifest) -> PriorityTier {
        if self.rules.is_development(manifest) {
            PriorityTier::Development
        } else if self.rules.is_official(manifest) {
            PriorityTier::Official
        } else if self.rules.is_core(name, manifest) {
            PriorityTier::Core
        } else if self.rules.is_trusted(manifest) {
            PriorityTier::ThirdParty
        } else {
            PriorityTier::Local
        }
    }

    pub fn set_priority_with_auto_detection(
        &mut self,
        name: &str,
        manifest: &PluginManifest,
    ) -> PriorityTier {
        let tier = self.auto_detect(name, manifest);
        self.set_priority(name, tier);
        tier
    }

    /// `Less` when `a` should come before `b`, i.e. has higher priority
    pub fn compare_priority(&self, a: &str, b: &str) -> Ordering {
        self.priority_value(b).cmp(&self.priority_value(a))
    }

    /// Sort highest priority first; equal tiers keep their input order
    pub fn sort_by_priority<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut sorted: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        sorted.sort_by(|a, b| self.compare_priority(a, b));
        sorted
    }

    pub fn is_higher_priority(&self, a: &str, b: &str) -> bool {
        self.priority_value(a) > self.priority_value(b)
    }

    pub fn plugins_at_tier(&self, tier: PriorityTier) -> Vec<String> {
        self.groups.get(&tier).cloned().unwrap_or_default()
    }

    pub fn higher_priority_plugins(&self, name: &str) -> Vec<String> {
        let current = self.priority_value(name);
        self.filter_known(|value| value > current)
    }

    pub fn lower_priority_plugins(&self, name: &str) -> Vec<String> {
        let current = self.priority_value(name);
        self.filter_known(|value| value < current)
    }

    pub fn highest_priority_plugins(&self) -> Vec<String> {
        match self.priorities.values().map(PriorityTier::value).max() {
            Some(max) => self.filter_known(|value| value == max),
            None => Vec::new(),
        }
    }

    pub fn lowest_priority_plugins(&self) -> Vec<String> {
        match self.priorities.values().map(PriorityTier::value).min() {
            Some(min) => self.filter_known(|value| value == min),
            None => Vec::new(),
        }
    }

    fn filter_known<F: Fn(u8) -> bool>(&self, keep: F) -> Vec<String> {
        self.order
            .iter()
            .filter(|name| keep(self.priority_value(name)))
            .cloned()
            .collect()
    }

    /// Plugin count per tier, every tier present
    pub fn distribution(&self) -> BTreeMap<PriorityTier, usize> {
        let mut distribution: BTreeMap<PriorityTier, usize> =
            PriorityTier::ALL.iter().map(|tier| (*tier, 0)).collect();
        for tier in self.priorities.values() {
            *distribution.entry(*tier).or_insert(0) += 1;
        }
        distribution
    }

    pub fn statistics(&self) -> PriorityStatistics {
        PriorityStatistics {
            total_plugins: self.priorities.len(),
            distribution: self.distribution(),
            highest_priority: self.highest_priority_plugins(),
            lowest_priority: self.lowest_priority_plugins(),
        }
    }

    pub fn report(&self) -> PriorityReport {
        let tiers = PriorityTier::ALL
            .iter()
            .map(|tier| {
                let plugins = self.plugins_at_tier(*tier);
                TierSummary {
                    tier: *tier,
                    numeric_value: tier.value(),
                    description: tier.description().to_string(),
                    plugin_count: plugins.len(),
                    plugins,
                }
            })
            .collect();

        PriorityReport {
            title: "Plugin Priority Report".to_string(),
            generated_at: Utc::now(),
            total_plugins: self.priorities.len(),
            tiers,
        }
    }

    /// Forget a plugin; it falls back to the default tier afterwards
    pub fn remove_plugin(&mut self, name: &str) -> Option<PriorityTier> {
        let tier = self.priorities.remove(name)?;
        self.order.retain(|n| n != name);
        if let Some(group) = self.groups.get_mut(&tier) {
            group.retain(|n| n != name);
        }
        Some(tier)
    }

    /// Drop every assignment, keeping the detection rules
    pub fn reset(&mut self) {
        self.priorities.clear();
        self.order.clear();
        self.groups.clear();
    }

    pub fn len(&self) -> usize {
        self.priorities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty()
    }
}

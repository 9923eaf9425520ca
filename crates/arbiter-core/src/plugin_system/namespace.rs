use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::Serialize;

use crate::kernel::constants::{DEFAULT_SIMILARITY_THRESHOLD, NAMESPACE_RECOMMENDATION_THRESHOLD};
use crate::plugin_system::priority::PriorityTier;
use crate::utils::{name_similarity, sanitize_identifier};

/// What to do about two plugins whose names are too alike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedResolution {
    Namespace,
    PriorityOverride,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamingConflict {
    pub plugins: [String; 2],
    pub similarity: f64,
    pub recommended: RecommendedResolution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespacedPlugin {
    pub name: String,
    pub namespace: String,
    /// 1 for the highest priority plugin of the group
    pub priority_rank: usize,
    pub tier: PriorityTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceResolution {
    /// Highest priority first
    pub plugins: Vec<NamespacedPlugin>,
    pub message: String,
}

impl NamespaceResolution {
    pub fn namespace_of(&self, name: &str) -> Option<&str> {
        self.plugins
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.namespace.as_str())
    }
}

/// Generates collision-free plugin identifiers of the form `<prefix>_<name>`.
#[derive(Debug, Clone)]
pub struct NamespaceAllocator {
    similarity_threshold: f64,
    cache: HashMap<(String, PriorityTier), String>,
    mappings: BTreeMap<String, String>,
}

impl Default for NamespaceAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl NamespaceAllocator {
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold,
            cache: HashMap::new(),
            mappings: BTreeMap::new(),
        }
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    /// Namespace for `name` at `tier`. Deterministic, cached per pair.
    pub fn generate(&mut self, name: &str, tier: PriorityTier) -> String {
        let key = (name.to_string(), tier);
        if let Some(namespace) = self.cache.get(&key) {
            return namespace.clone();
        }

        let namespace = format!("{}_{}", tier.namespace_prefix(), sanitize_identifier(name));
        debug!("Generated namespace {} for plugin {}", namespace, name);
        self.cache.insert(key, namespace.clone());
        self.mappings.insert(name.to_string(), namespace.clone());
        namespace
    }

    /// Pairs of plugins whose names are more similar than the threshold
    pub fn detect_conflicts(&self, plugins: &[(String, PriorityTier)]) -> Vec<NamingConflict> {
        let mut conflicts = Vec::new();
        for (i, (name_a, tier_a)) in plugins.iter().enumerate() {
            for (name_b, tier_b) in plugins.iter().skip(i + 1) {
                let similarity = name_similarity(name_a, name_b);
                if similarity <= self.similarity_threshold {
                    continue;
                }
                let recommended =
                    if similarity > NAMESPACE_RECOMMENDATION_THRESHOLD || tier_a == tier_b {
                        RecommendedResolution::Namespace
                    } else {
                        RecommendedResolution::PriorityOverride
                    };
                conflicts.push(NamingConflict {
                    plugins: [name_a.clone(), name_b.clone()],
                    similarity,
                    recommended,
                });
            }
        }
        conflicts
    }

    /// Namespace every plugin of a conflicting group.
    ///
    /// The highest tier keeps the bare namespace; the plugin at rank `n > 1`
    /// gets `_n` appended. Equal tiers keep their input order.
    pub fn resolve(&mut self, plugins: &[(String, PriorityTier)]) -> NamespaceResolution {
        let mut sorted: Vec<&(String, PriorityTier)> = plugins.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));

        let mut resolved = Vec::with_capacity(sorted.len());
        for (index, (name, tier)) in sorted.into_iter().enumerate() {
            let rank = index + 1;
            let mut namespace = self.generate(name, *tier);
            if rank > 1 {
                namespace = format!("{}_{}", namespace, rank);
            }
            self.mappings.insert(name.clone(), namespace.clone());
            resolved.push(NamespacedPlugin {
                name: name.clone(),
                namespace,
                priority_rank: rank,
                tier: *tier,
            });
        }

        NamespaceResolution {
            message: format!("Created namespaces for {} conflicting plugins", resolved.len()),
            plugins: resolved,
        }
    }

    /// Current plugin name -> namespace assignments
    pub fn namespace_mapping(&self) -> BTreeMap<String, String> {
        self.mappings.clone()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.mappings.clear();
    }
}

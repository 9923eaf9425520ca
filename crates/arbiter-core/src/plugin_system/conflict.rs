use std::collections::{BTreeMap, HashMap, HashSet};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::event::{default_reporter, EngineEvent, SharedReporter};
use crate::kernel::constants::PLUGIN_METHOD_PREFIX;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::namespace::NamespaceAllocator;
use crate::plugin_system::priority::PriorityRegistry;
use crate::plugin_system::registry::PluginRegistry;
use crate::utils::name_similarity;

/// What a detected conflict collides on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Command,
    Method,
    Namespace,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::Command => "command",
            ConflictKind::Method => "method",
            ConflictKind::Namespace => "namespace",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of plugins claiming the same command, method or namespace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginConflict {
    /// The contested command or method, or `"a_vs_b"` for namespaces
    pub name: String,
    pub kind: ConflictKind,
    /// Registry order
    pub plugins: Vec<String>,
    /// Name similarity, namespace conflicts only
    pub similarity: Option<f64>,
}

impl PluginConflict {
    pub fn involves(&self, plugin: &str) -> bool {
        self.plugins.iter().any(|p| p == plugin)
    }
}

/// Conflicts found by [`ConflictResolver::detect_conflicts`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConflictReport {
    pub command_conflicts: Vec<PluginConflict>,
    pub method_conflicts: Vec<PluginConflict>,
    pub namespace_conflicts: Vec<PluginConflict>,
}

impl ConflictReport {
    /// Every conflict: commands, then methods, then namespaces
    pub fn iter(&self) -> impl Iterator<Item = &PluginConflict> {
        self.command_conflicts
            .iter()
            .chain(self.method_conflicts.iter())
            .chain(self.namespace_conflicts.iter())
    }

    pub fn len(&self) -> usize {
        self.command_conflicts.len() + self.method_conflicts.len() + self.namespace_conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capability a conflict is resolved for; selects the default strategy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictType {
    CommandName,
    StatisticsMethod,
    FileFormat,
    OutputFormat,
    Validator,
    Command,
    Method,
    Namespace,
    Custom(String),
}

impl ConflictType {
    pub fn as_str(&self) -> &str {
        match self {
            ConflictType::CommandName => "command_name",
            ConflictType::StatisticsMethod => "statistics_method",
            ConflictType::FileFormat => "file_format",
            ConflictType::OutputFormat => "output_format",
            ConflictType::Validator => "validator",
            ConflictType::Command => "command",
            ConflictType::Method => "method",
            ConflictType::Namespace => "namespace",
            ConflictType::Custom(name) => name,
        }
    }

    /// Detection kind whose log entries this type resolves
    pub fn detection_kind(&self) -> Option<ConflictKind> {
        match self {
            ConflictType::CommandName | ConflictType::Command => Some(ConflictKind::Command),
            ConflictType::StatisticsMethod | ConflictType::Method => Some(ConflictKind::Method),
            ConflictType::Namespace => Some(ConflictKind::Namespace),
            _ => None,
        }
    }
}

impl From<ConflictKind> for ConflictType {
    fn from(kind: ConflictKind) -> Self {
        match kind {
            ConflictKind::Command => ConflictType::Command,
            ConflictKind::Method => ConflictType::Method,
            ConflictKind::Namespace => ConflictType::Namespace,
        }
    }
}

impl FromStr for ConflictType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "command_name" => ConflictType::CommandName,
            "statistics_method" => ConflictType::StatisticsMethod,
            "file_format" => ConflictType::FileFormat,
            "output_format" => ConflictType::OutputFormat,
            "validator" => ConflictType::Validator,
            "command" => ConflictType::Command,
            "method" => ConflictType::Method,
            "namespace" => ConflictType::Namespace,
            other => ConflictType::Custom(other.to_string()),
        })
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a conflict is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Refuse: conflicts are errors
    Strict,
    /// Highest priority wins, with a warning
    WarnOverride,
    /// Highest priority wins quietly
    SilentOverride,
    /// Every plugin coexists under its own namespace
    Namespace,
    /// Ask the user, via registered responses
    Interactive,
    /// Pick a strategy from the conflict type
    Auto,
}

impl ConflictStrategy {
    pub const ALL: [ConflictStrategy; 6] = [
        ConflictStrategy::Strict,
        ConflictStrategy::WarnOverride,
        ConflictStrategy::SilentOverride,
        ConflictStrategy::Namespace,
        ConflictStrategy::Interactive,
        ConflictStrategy::Auto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictStrategy::Strict => "strict",
            ConflictStrategy::WarnOverride => "warn_override",
            ConflictStrategy::SilentOverride => "silent_override",
            ConflictStrategy::Namespace => "namespace",
            ConflictStrategy::Interactive => "interactive",
            ConflictStrategy::Auto => "auto",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConflictStrategy::Strict => "Fail immediately on any conflict",
            ConflictStrategy::WarnOverride => "Override with warning message",
            ConflictStrategy::SilentOverride => "Override silently using priority",
            ConflictStrategy::Namespace => "Use namespaced plugin names",
            ConflictStrategy::Interactive => "Prompt user for resolution choice",
            ConflictStrategy::Auto => "Automatically resolve using priority and heuristics",
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictStrategy {
    type Err = PluginSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ConflictStrategy::ALL
            .iter()
            .find(|strategy| strategy.as_str() == name)
            .copied()
            .ok_or_else(|| {
                PluginSystemError::InvalidStrategy(format!(
                    "Invalid resolution strategy: {}. Valid strategies: {}",
                    name,
                    ConflictStrategy::ALL
                        .iter()
                        .map(ConflictStrategy::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// A pre-recorded answer for an interactive resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractiveResponse {
    SelectPlugin(String),
    NamespaceAll,
    Cancel,
    /// Anything unrecognised; resolved automatically
    Other(String),
}

/// Outcome of resolving one conflict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictResolution {
    pub success: bool,
    pub strategy: ConflictStrategy,
    pub winner: Option<String>,
    pub losers: Vec<String>,
    pub warnings: Vec<String>,
    pub namespaced_plugins: BTreeMap<String, String>,
    /// Validators run in this order
    pub chain_order: Vec<String>,
    pub error: Option<String>,
    pub message: String,
    /// Decided by an interactive response
    pub user_choice: bool,
    /// Interactive resolution fell back to automatic
    pub fallback: bool,
}

impl ConflictResolution {
    fn new(strategy: ConflictStrategy, success: bool, message: String) -> Self {
        Self {
            success,
            strategy,
            winner: None,
            losers: Vec::new(),
            warnings: Vec::new(),
            namespaced_plugins: BTreeMap::new(),
            chain_order: Vec::new(),
            error: None,
            message,
            user_choice: false,
            fallback: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedResolution {
    pub strategy: ConflictStrategy,
    pub result: ConflictResolution,
    pub resolved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictLogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: ConflictKind,
    pub conflict: PluginConflict,
    pub resolved: bool,
    pub resolution: Option<LoggedResolution>,
}

/// A reported conflict together with how it was resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConflict {
    pub conflict: PluginConflict,
    pub strategy: ConflictStrategy,
    pub resolution: ConflictResolution,
}

/// Strategy choices for [`ConflictResolver::resolve_all_conflicts`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyOverrides {
    pub per_kind: HashMap<ConflictKind, ConflictStrategy>,
    pub global: Option<ConflictStrategy>,
}

impl StrategyOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: ConflictKind, strategy: ConflictStrategy) -> Self {
        self.per_kind.insert(kind, strategy);
        self
    }

    pub fn with_global(mut self, strategy: ConflictStrategy) -> Self {
        self.global = Some(strategy);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub resolutions: Vec<ResolvedConflict>,
    pub would_succeed: bool,
    pub conflicts_resolved: usize,
    /// Resolutions that produced at least one warning
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictResolutionReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub total_conflicts: usize,
    pub conflicts_by_kind: BTreeMap<ConflictKind, usize>,
    pub resolutions: BTreeMap<String, ConflictResolution>,
    pub conflict_log: Vec<ConflictLogEntry>,
    pub namespace_mappings: BTreeMap<String, String>,
    pub recommendations: Vec<String>,
}

fn default_strategy_table() -> HashMap<ConflictType, ConflictStrategy> {
    HashMap::from([
        (ConflictType::CommandName, ConflictStrategy::WarnOverride),
        (ConflictType::StatisticsMethod, ConflictStrategy::Namespace),
        (ConflictType::FileFormat, ConflictStrategy::Strict),
        (ConflictType::OutputFormat, ConflictStrategy::Namespace),
        (ConflictType::Validator, ConflictStrategy::Auto),
    ])
}

/// Conflict type plus the sorted plugin names
type ResolutionKey = (ConflictType, Vec<String>);

fn resolution_key(conflict_type: &ConflictType, plugins: &[String]) -> ResolutionKey {
    let mut sorted = plugins.to_vec();
    sorted.sort_unstable();
    (conflict_type.clone(), sorted)
}

/// Groups `(key, plugin)` claims, keeping first-seen order; groups of one are dropped
fn group_claims<'a, I>(claims: I, kind: ConflictKind) -> Vec<PluginConflict>
where
    I: Iterator<Item = (&'a str, &'a str)>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<String>)> = Vec::new();

    for (key, plugin) in claims {
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        let members = &mut groups[slot].1;
        if !members.iter().any(|m| m == plugin) {
            members.push(plugin.to_string());
        }
    }

    groups
        .into_iter()
        .filter(|(_, plugins)| plugins.len() > 1)
        .map(|(name, plugins)| PluginConflict {
            name: name.to_string(),
            kind,
            plugins,
            similarity: None,
        })
        .collect()
}

/// Detects and settles plugins competing for the same capability.
///
/// Ranks plugins through its [`PriorityRegistry`] and allocates namespaces
/// through its [`NamespaceAllocator`]. Keeps an append-only conflict log whose
/// entries are marked resolved as resolutions come in, and caches the latest
/// resolution per `(type, sorted plugin names)`.
pub struct ConflictResolver {
    priorities: PriorityRegistry,
    namespaces: NamespaceAllocator,
    conflict_log: Vec<ConflictLogEntry>,
    resolution_cache: BTreeMap<ResolutionKey, ConflictResolution>,
    interactive_responses: HashMap<ResolutionKey, InteractiveResponse>,
    namespace_mappings: BTreeMap<String, String>,
    default_strategies: HashMap<ConflictType, ConflictStrategy>,
    reporter: SharedReporter,
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new(PriorityRegistry::new())
    }
}

impl ConflictResolver {
    pub fn new(priorities: PriorityRegistry) -> Self {
        Self::with_components(priorities, NamespaceAllocator::default(), default_reporter())
    }

    pub fn with_components(
        priorities: PriorityRegistry,
        namespaces: NamespaceAllocator,
        reporter: SharedReporter,
    ) -> Self {
        Self {
            priorities,
            namespaces,
            conflict_log: Vec::new(),
            resolution_cache: BTreeMap::new(),
            interactive_responses: HashMap::new(),
            namespace_mappings: BTreeMap::new(),
            default_strategies: default_strategy_table(),
            reporter,
        }
    }

    pub fn priorities(&self) -> &PriorityRegistry {
        &self.priorities
    }

    pub fn priorities_mut(&mut self) -> &mut PriorityRegistry {
        &mut self.priorities
    }

    pub fn namespaces(&self) -> &NamespaceAllocator {
        &self.namespaces
    }

    /// Scan the registry for command, method and namespace collisions.
    ///
    /// Every conflict found is appended to the conflict log as unresolved.
    pub fn detect_conflicts(&mut self, registry: &PluginRegistry) -> ConflictReport {
        let report = ConflictReport {
            command_conflicts: self.detect_command_conflicts(registry),
            method_conflicts: self.detect_method_conflicts(registry),
            namespace_conflicts: self.detect_namespace_conflicts(registry),
        };

        let now = Utc::now();
        for conflict in report.iter() {
            warn!(
                "Detected {} conflict '{}' between {}",
                conflict.kind,
                conflict.name,
                conflict.plugins.join(", ")
            );
            self.reporter.report(&EngineEvent::ConflictDetected {
                kind: conflict.kind.to_string(),
                name: conflict.name.clone(),
                plugins: conflict.plugins.clone(),
            });
            self.conflict_log.push(ConflictLogEntry {
                timestamp: now,
                kind: conflict.kind,
                conflict: conflict.clone(),
                resolved: false,
                resolution: None,
            });
        }

        report
    }

    fn detect_command_conflicts(&self, registry: &PluginRegistry) -> Vec<PluginConflict> {
        let claims = registry.iter().flat_map(|manifest| {
            manifest
                .commands
                .keys()
                .map(move |command| (command.as_str(), manifest.name.as_str()))
        });
        group_claims(claims, ConflictKind::Command)
    }

    fn detect_method_conflicts(&self, registry: &PluginRegistry) -> Vec<PluginConflict> {
        let claims = registry.iter().flat_map(|manifest| {
            manifest
                .methods
                .iter()
                .filter(|method| !method.starts_with(PLUGIN_METHOD_PREFIX))
                .map(move |method| (method.as_str(), manifest.name.as_str()))
        });
        group_claims(claims, ConflictKind::Method)
    }

    fn detect_namespace_conflicts(&self, registry: &PluginRegistry) -> Vec<PluginConflict> {
        let threshold = self.namespaces.similarity_threshold();
        let mut conflicts = Vec::new();

        for a in registry.iter() {
            for b in registry.iter() {
                if a.name >= b.name {
                    continue;
                }
                let similarity = name_similarity(&a.name, &b.name);
                if similarity <= threshold {
                    continue;
                }
                conflicts.push(PluginConflict {
                    name: format!("{}_vs_{}", a.name, b.name),
                    kind: ConflictKind::Namespace,
                    plugins: vec![a.name.clone(), b.name.clone()],
                    similarity: Some(similarity),
                });
            }
        }
        conflicts
    }

    /// Strategy used when none is given for `conflict_type`
    pub fn default_strategy(&self, conflict_type: &ConflictType) -> ConflictStrategy {
        self.default_strategies
            .get(conflict_type)
            .copied()
            .unwrap_or(ConflictStrategy::Auto)
    }

    pub fn set_default_strategy(&mut self, conflict_type: ConflictType, strategy: ConflictStrategy) {
        debug!("Default strategy for {} set to {}", conflict_type, strategy);
        self.default_strategies.insert(conflict_type, strategy);
    }

    /// Settle a conflict between `plugins` over `conflict_type`.
    ///
    /// Recomputes on every call; the result replaces any cached resolution
    /// for the same type and plugin set.
    pub fn resolve_conflict(
        &mut self,
        conflict_type: &ConflictType,
        plugins: &[String],
        strategy: Option<ConflictStrategy>,
    ) -> ConflictResolution {
        let strategy = strategy.unwrap_or_else(|| self.default_strategy(conflict_type));

        let resolution = match strategy {
            ConflictStrategy::Strict => self.resolve_strict(conflict_type, plugins),
            ConflictStrategy::WarnOverride => self.resolve_override(conflict_type, plugins, true),
            ConflictStrategy::SilentOverride => self.resolve_override(conflict_type, plugins, false),
            ConflictStrategy::Namespace => self.resolve_namespace(conflict_type, plugins),
            ConflictStrategy::Interactive => self.resolve_interactive(conflict_type, plugins),
            ConflictStrategy::Auto => self.resolve_auto(conflict_type, plugins),
        };

        self.resolution_cache
            .insert(resolution_key(conflict_type, plugins), resolution.clone());
        self.log_resolution(conflict_type, strategy, &resolution);

        resolution
    }

    fn resolve_strict(&self, conflict_type: &ConflictType, plugins: &[String]) -> ConflictResolution {
        let mut resolution = ConflictResolution::new(
            ConflictStrategy::Strict,
            false,
            "Strict mode: conflicts are not allowed".to_string(),
        );
        resolution.error = Some(format!(
            "Conflict detected: {} conflict on {}",
            plugins.join(", "),
            conflict_type
        ));
        resolution
    }

    fn resolve_override(
        &self,
        conflict_type: &ConflictType,
        plugins: &[String],
        warn: bool,
    ) -> ConflictResolution {
        let mut ranked = self.priorities.sort_by_priority(plugins).into_iter();
        let winner = ranked.next();
        let losers: Vec<String> = ranked.collect();

        let mut resolution = if warn {
            let mut resolution = ConflictResolution::new(
                ConflictStrategy::WarnOverride,
                true,
                format!("Warning: {} conflict resolved using priority system", conflict_type),
            );
            resolution.warnings.push(format!(
                "Plugin conflict resolved: {} overrides {} for {}",
                winner.as_deref().unwrap_or_default(),
                losers.join(", "),
                conflict_type
            ));
            resolution
        } else {
            ConflictResolution::new(
                ConflictStrategy::SilentOverride,
                true,
                format!("Silently resolved {} conflict using priority", conflict_type),
            )
        };
        resolution.winner = winner;
        resolution.losers = losers;
        resolution
    }

    fn resolve_namespace(
        &mut self,
        conflict_type: &ConflictType,
        plugins: &[String],
    ) -> ConflictResolution {
        let mut namespaced = BTreeMap::new();
        let mut assigned = Vec::with_capacity(plugins.len());
        for plugin in plugins {
            let tier = self.priorities.get_priority(plugin);
            let namespace = self.namespaces.generate(plugin, tier);
            self.namespace_mappings
                .insert(plugin.clone(), namespace.clone());
            assigned.push(namespace.clone());
            namespaced.insert(plugin.clone(), namespace);
        }

        let mut resolution = ConflictResolution::new(
            ConflictStrategy::Namespace,
            true,
            format!(
                "Created namespaces for {} conflict: {}",
                conflict_type,
                assigned.join(", ")
            ),
        );
        resolution.namespaced_plugins = namespaced;
        resolution
    }

    fn resolve_auto(&mut self, conflict_type: &ConflictType, plugins: &[String]) -> ConflictResolution {
        match conflict_type {
            ConflictType::CommandName => self.resolve_override(conflict_type, plugins, true),
            ConflictType::FileFormat | ConflictType::OutputFormat => {
                self.resolve_override(conflict_type, plugins, false)
            }
            ConflictType::Validator => self.chain_validators(plugins),
            _ => self.resolve_namespace(conflict_type, plugins),
        }
    }

    fn chain_validators(&self, plugins: &[String]) -> ConflictResolution {
        let order = self.priorities.sort_by_priority(plugins);
        let mut resolution = ConflictResolution::new(
            ConflictStrategy::Auto,
            true,
            format!("Chained validators in priority order: {}", order.join(" -> ")),
        );
        resolution.chain_order = order;
        resolution
    }

    fn resolve_interactive(
        &mut self,
        conflict_type: &ConflictType,
        plugins: &[String],
    ) -> ConflictResolution {
        let key = resolution_key(conflict_type, plugins);
        let Some(response) = self.interactive_responses.get(&key).cloned() else {
            let mut resolution = self.resolve_auto(conflict_type, plugins);
            resolution.strategy = ConflictStrategy::Interactive;
            resolution.fallback = true;
            resolution.message =
                "Interactive resolution unavailable, used automatic fallback".to_string();
            return resolution;
        };

        match response {
            InteractiveResponse::SelectPlugin(winner) => {
                let mut resolution = ConflictResolution::new(
                    ConflictStrategy::Interactive,
                    true,
                    format!("User selected {} for {}", winner, conflict_type),
                );
                resolution.losers = plugins.iter().filter(|p| **p != winner).cloned().collect();
                resolution.winner = Some(winner);
                resolution.user_choice = true;
                resolution
            }
            InteractiveResponse::NamespaceAll => {
                let mut resolution = self.resolve_namespace(conflict_type, plugins);
                resolution.strategy = ConflictStrategy::Interactive;
                resolution.user_choice = true;
                resolution
            }
            InteractiveResponse::Cancel => {
                let mut resolution = ConflictResolution::new(
                    ConflictStrategy::Interactive,
                    false,
                    "Interactive resolution cancelled by user".to_string(),
                );
                resolution.error = Some("User cancelled conflict resolution".to_string());
                resolution
            }
            InteractiveResponse::Other(action) => {
                debug!("Unrecognised interactive response '{}'", action);
                let mut resolution = self.resolve_auto(conflict_type, plugins);
                resolution.strategy = ConflictStrategy::Interactive;
                resolution.fallback = true;
                resolution.message =
                    "Invalid interactive response, used automatic fallback".to_string();
                resolution
            }
        }
    }

    /// Mark the first unresolved log entry of the matching kind as resolved
    fn log_resolution(
        &mut self,
        conflict_type: &ConflictType,
        strategy: ConflictStrategy,
        resolution: &ConflictResolution,
    ) {
        if resolution.success {
            info!(
                "Resolved {} conflict with {}: {}",
                conflict_type, strategy, resolution.message
            );
        } else {
            warn!(
                "Could not resolve {} conflict with {}: {}",
                conflict_type, strategy, resolution.message
            );
        }
        self.reporter.report(&EngineEvent::ConflictResolved {
            conflict_type: conflict_type.to_string(),
            strategy: strategy.to_string(),
            success: resolution.success,
            winner: resolution.winner.clone(),
        });

        let Some(kind) = conflict_type.detection_kind() else {
            return;
        };
        if let Some(entry) = self
            .conflict_log
            .iter_mut()
            .find(|entry| entry.kind == kind && !entry.resolved)
        {
            entry.resolved = true;
            entry.resolution = Some(LoggedResolution {
                strategy,
                result: resolution.clone(),
                resolved_at: Utc::now(),
            });
        }
    }

    /// Resolve every conflict of `report`, in report order.
    ///
    /// The strategy for each conflict is the per-kind override, else the
    /// global override, else the default for the conflict's kind.
    pub fn resolve_all_conflicts(
        &mut self,
        report: &ConflictReport,
        overrides: &StrategyOverrides,
    ) -> Vec<ResolvedConflict> {
        let mut resolved = Vec::with_capacity(report.len());
        for conflict in report.iter() {
            let conflict_type = ConflictType::from(conflict.kind);
            let strategy = overrides
                .per_kind
                .get(&conflict.kind)
                .copied()
                .or(overrides.global)
                .unwrap_or_else(|| self.default_strategy(&conflict_type));

            let resolution = self.resolve_conflict(&conflict_type, &conflict.plugins, Some(strategy));
            resolved.push(ResolvedConflict {
                conflict: conflict.clone(),
                strategy,
                resolution,
            });
        }
        resolved
    }

    /// Dry run of [`resolve_all_conflicts`](Self::resolve_all_conflicts); leaves no trace
    pub fn simulate_resolution(
        &mut self,
        report: &ConflictReport,
        overrides: &StrategyOverrides,
    ) -> SimulationResult {
        let saved_cache = self.resolution_cache.clone();
        let saved_log = self.conflict_log.clone();
        let saved_mappings = self.namespace_mappings.clone();
        let saved_namespaces = self.namespaces.clone();

        let resolutions = self.resolve_all_conflicts(report, overrides);

        self.resolution_cache = saved_cache;
        self.conflict_log = saved_log;
        self.namespace_mappings = saved_mappings;
        self.namespaces = saved_namespaces;

        SimulationResult {
            would_succeed: resolutions.iter().all(|r| r.resolution.success),
            conflicts_resolved: resolutions.len(),
            warnings: resolutions
                .iter()
                .filter(|r| !r.resolution.warnings.is_empty())
                .count(),
            resolutions,
        }
    }

    /// Record the answer an interactive resolution of this conflict will use
    pub fn set_interactive_response(
        &mut self,
        conflict_type: &ConflictType,
        plugins: &[String],
        response: InteractiveResponse,
    ) {
        self.interactive_responses
            .insert(resolution_key(conflict_type, plugins), response);
    }

    pub fn get_cached_resolution(
        &self,
        conflict_type: &ConflictType,
        plugins: &[String],
    ) -> Option<&ConflictResolution> {
        self.resolution_cache
            .get(&resolution_key(conflict_type, plugins))
    }

    /// Whether a logged conflict involves both plugins
    pub fn conflict_exists(&self, a: &str, b: &str, kind: Option<ConflictKind>) -> bool {
        self.conflict_log.iter().any(|entry| {
            entry.conflict.involves(a)
                && entry.conflict.involves(b)
                && kind.is_none_or(|k| entry.kind == k)
        })
    }

    /// Every plugin that shares a logged conflict with `plugin`
    pub fn conflicting_plugins(&self, plugin: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for entry in &self.conflict_log {
            if !entry.conflict.involves(plugin) {
                continue;
            }
            for other in &entry.conflict.plugins {
                if other != plugin && seen.insert(other.clone()) {
                    result.push(other.clone());
                }
            }
        }
        result
    }

    pub fn conflict_log(&self) -> &[ConflictLogEntry] {
        &self.conflict_log
    }

    pub fn namespace_mappings(&self) -> &BTreeMap<String, String> {
        &self.namespace_mappings
    }

    pub fn generate_report(&self) -> ConflictResolutionReport {
        let mut conflicts_by_kind = BTreeMap::new();
        for entry in &self.conflict_log {
            *conflicts_by_kind.entry(entry.kind).or_insert(0) += 1;
        }

        ConflictResolutionReport {
            title: "Plugin Conflict Resolution Report".to_string(),
            generated_at: Utc::now(),
            total_conflicts: self.conflict_log.len(),
            conflicts_by_kind,
            resolutions: self
                .resolution_cache
                .iter()
                .map(|((conflict_type, plugins), resolution)| {
                    (format!("{} [{}]", conflict_type, plugins.join(", ")), resolution.clone())
                })
                .collect(),
            conflict_log: self.conflict_log.clone(),
            namespace_mappings: self.namespace_mappings.clone(),
            recommendations: self.recommendations(),
        }
    }

    fn recommendations(&self) -> Vec<String> {
        let mut recommendations = Vec::new();

        let command_conflicts = self
            .conflict_log
            .iter()
            .filter(|entry| entry.kind == ConflictKind::Command)
            .count();
        if command_conflicts > 3 {
            recommendations
                .push("Consider using more specific command names to reduce conflicts".to_string());
        }

        if self.namespace_mappings.len() > 5 {
            recommendations.push(
                "High number of namespace conflicts detected, consider plugin naming conventions"
                    .to_string(),
            );
        }

        let unresolved = self.conflict_log.iter().filter(|entry| !entry.resolved).count();
        if unresolved > 0 {
            recommendations.push(format!("{} conflicts remain unresolved", unresolved));
        }

        if recommendations.is_empty() {
            recommendations.push("No specific recommendations".to_string());
        }
        recommendations
    }

    /// Forget the conflict log, cached resolutions and interactive responses
    pub fn clear_history(&mut self) {
        self.conflict_log.clear();
        self.resolution_cache.clear();
        self.interactive_responses.clear();
    }
}

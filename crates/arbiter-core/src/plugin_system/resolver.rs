use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::event::{default_reporter, EngineEvent, SharedReporter};
use crate::kernel::constants::DEFAULT_PLUGIN_VERSION;
use crate::plugin_system::dependency::{DependencyError, PluginDependency};
use crate::plugin_system::registry::PluginRegistry;
use crate::plugin_system::strategy::StrategyKind;
use crate::plugin_system::version::{VersionComparator, VersionError};

/// Options that change the outcome of a resolution; part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResolveOptions {
    /// Validate declared version constraints against registered versions
    pub check_versions: bool,
    /// Ignore dependencies flagged as optional
    pub skip_optional: bool,
}

impl ResolveOptions {
    pub fn checked() -> Self {
        Self {
            check_versions: true,
            skip_optional: false,
        }
    }
}

/// Knobs a [`ResolutionStrategy`](crate::plugin_system::strategy::ResolutionStrategy) passes to
/// [`DependencyResolver::standard_resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StandardOptions {
    pub skip_optional: bool,
    /// Recorded for version selection; does not change the load order
    pub prefer_newer: bool,
}

/// Computes load orders over the plugin dependency graph.
///
/// Each fresh resolution rebuilds the graph reachable from the root, rejects
/// cycles, sorts it so that every dependency precedes its dependents, and then
/// checks that every plugin in the order is registered (and optionally that
/// declared version constraints hold). Successful results are cached per
/// `(root, options)` until [`clear_cache`](Self::clear_cache) is called.
pub struct DependencyResolver {
    /// plugin -> direct dependency edges, as built for the last resolution
    graph: HashMap<String, Vec<PluginDependency>>,
    /// Graph nodes in discovery order
    graph_order: Vec<String>,
    cache: HashMap<(String, ResolveOptions), Vec<String>>,
    strategy: StrategyKind,
    prefer_newer: bool,
    check_versions: bool,
    reporter: SharedReporter,
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::with_reporter(default_reporter())
    }

    pub fn with_reporter(reporter: SharedReporter) -> Self {
        Self {
            graph: HashMap::new(),
            graph_order: Vec::new(),
            cache: HashMap::new(),
            strategy: StrategyKind::default(),
            prefer_newer: false,
            check_versions: false,
            reporter,
        }
    }

    /// Strategy used by [`resolve_with_strategy`](Self::resolve_with_strategy)
    pub fn set_strategy(&mut self, strategy: StrategyKind) {
        self.strategy = strategy;
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Whether strategy-driven resolutions validate version constraints
    pub fn set_check_versions(&mut self, check_versions: bool) {
        self.check_versions = check_versions;
    }

    /// Whether the last strategy-driven resolution asked for newer versions
    pub fn prefers_newer(&self) -> bool {
        self.prefer_newer
    }

    /// Resolve `name` into a load order, dependencies first.
    pub fn resolve(
        &mut self,
        registry: &PluginRegistry,
        name: &str,
        options: ResolveOptions,
    ) -> Result<Vec<String>, DependencyError> {
        let key = (name.to_string(), options);
        if let Some(order) = self.cache.get(&key) {
            debug!("Using cached resolution for {}", name);
            self.reporter.report(&EngineEvent::ResolutionCompleted {
                plugin_id: name.to_string(),
                order: order.clone(),
                cached: true,
            });
            return Ok(order.clone());
        }

        self.reporter.report(&EngineEvent::ResolutionStarted {
            plugin_id: name.to_string(),
        });

        match self.resolve_uncached(registry, name, options) {
            Ok(order) => {
                self.reporter.report(&EngineEvent::ResolutionCompleted {
                    plugin_id: name.to_string(),
                    order: order.clone(),
                    cached: false,
                });
                self.cache.insert(key, order.clone());
                Ok(order)
            }
            Err(err) => {
                warn!("Dependency resolution for {} failed: {}", name, err);
                self.reporter.report(&EngineEvent::ResolutionFailed {
                    plugin_id: name.to_string(),
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn resolve_uncached(
        &mut self,
        registry: &PluginRegistry,
        name: &str,
        options: ResolveOptions,
    ) -> Result<Vec<String>, DependencyError> {
        if !registry.has_plugin(name) {
            return Err(DependencyError::PluginNotFound(name.to_string()));
        }

        self.build_graph(registry, name, options.skip_optional);

        if let Some(cycle) = self.find_cycle() {
            return Err(DependencyError::CircularDependency { cycle });
        }

        let order = self.topological_order(name);

        let missing: Vec<String> = order
            .iter()
            .filter(|plugin| !registry.has_plugin(plugin))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(DependencyError::UnresolvedDependency {
                plugin: name.to_string(),
                missing,
            });
        }

        if options.check_versions {
            self.validate_versions(registry, &order)?;
        }

        Ok(order)
    }

    /// Strategy hook: resolve with the given knobs, versions checked if configured
    pub fn standard_resolve(
        &mut self,
        registry: &PluginRegistry,
        name: &str,
        options: StandardOptions,
    ) -> Result<Vec<String>, DependencyError> {
        self.prefer_newer = options.prefer_newer;
        if options.prefer_newer {
            debug!("Resolving {} preferring newer versions", name);
        }
        let resolve_options = ResolveOptions {
            check_versions: self.check_versions,
            skip_optional: options.skip_optional,
        };
        self.resolve(registry, name, resolve_options)
    }

    /// Resolve through the configured strategy
    pub fn resolve_with_strategy(
        &mut self,
        registry: &PluginRegistry,
        name: &str,
    ) -> Result<Vec<String>, DependencyError> {
        let strategy = self.strategy.strategy();
        strategy.resolve(self, registry, name)
    }

    /// Resolve several roots and merge them into a single load order
    pub fn resolve_multiple<S: AsRef<str>>(
        &mut self,
        registry: &PluginRegistry,
        names: &[S],
        options: ResolveOptions,
    ) -> Result<Vec<String>, DependencyError> {
        let mut union: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for name in names {
            for plugin in self.resolve(registry, name.as_ref(), options)? {
                if seen.insert(plugin.clone()) {
                    union.push(plugin);
                }
            }
        }

        Ok(order_within(registry, &union, options.skip_optional))
    }

    /// All direct dependencies of `name` are registered
    pub fn dependencies_satisfied(&self, registry: &PluginRegistry, name: &str) -> bool {
        match registry.get_plugin(name) {
            Some(manifest) => manifest
                .dependencies
                .iter()
                .all(|dep| registry.has_plugin(&dep.plugin_name)),
            None => false,
        }
    }

    /// Direct dependencies of `name` that are not registered
    pub fn missing_dependencies(&self, registry: &PluginRegistry, name: &str) -> Vec<String> {
        registry
            .get_plugin(name)
            .map(|manifest| {
                manifest
                    .dependencies
                    .iter()
                    .filter(|dep| !registry.has_plugin(&dep.plugin_name))
                    .map(|dep| dep.plugin_name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the registered version of `dependency` satisfies `required`
    pub fn version_compatible(
        &self,
        registry: &PluginRegistry,
        dependency: &str,
        required: Option<&str>,
    ) -> Result<bool, VersionError> {
        let available = registry
            .version_of(dependency)
            .unwrap_or(DEFAULT_PLUGIN_VERSION);
        VersionComparator::satisfies(available, required)
    }

    /// Forget cached resolutions, e.g. after the registry changed
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Direct dependencies of `name` in the last built graph
    pub fn graph_edges(&self, name: &str) -> Option<Vec<&str>> {
        self.graph
            .get(name)
            .map(|deps| deps.iter().map(|d| d.plugin_name.as_str()).collect())
    }

    fn build_graph(&mut self, registry: &PluginRegistry, root: &str, skip_optional: bool) {
        self.graph.clear();
        self.graph_order.clear();

        let mut visited: HashSet<String> = HashSet::new();
        let mut pending = vec![root.to_string()];

        while let Some(name) = pending.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(manifest) = registry.get_plugin(&name) else {
                continue;
            };

            let edges: Vec<PluginDependency> = manifest
                .dependencies
                .iter()
                .filter(|dep| !(skip_optional && dep.is_optional()))
                .cloned()
                .collect();

            for dep in edges.iter().rev() {
                if !visited.contains(&dep.plugin_name) {
                    pending.push(dep.plugin_name.clone());
                }
            }
            self.graph_order.push(name.clone());
            self.graph.insert(name, edges);
        }
    }

    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited: HashSet<&str> = HashSet::new();

        for node in &self.graph_order {
            if let Some(cycle) = self.find_cycle_from(node, &mut visited) {
                return Some(cycle);
            }
        }
        None
    }

    /// Depth-first walk keeping the current path as `(node, next edge)` frames
    fn find_cycle_from<'a>(
        &'a self,
        root: &'a str,
        visited: &mut HashSet<&'a str>,
    ) -> Option<Vec<String>> {
        if !visited.insert(root) {
            return None;
        }
        let mut path: Vec<(&'a str, usize)> = vec![(root, 0)];
        let mut on_path: HashSet<&'a str> = HashSet::from([root]);

        while let Some(&(node, index)) = path.last() {
            let deps = self.graph.get(node).map(Vec::as_slice).unwrap_or_default();
            let Some(dep) = deps.get(index) else {
                on_path.remove(node);
                path.pop();
                continue;
            };
            if let Some(frame) = path.last_mut() {
                frame.1 += 1;
            }

            let child = dep.plugin_name.as_str();
            if on_path.contains(child) {
                let start = path.iter().position(|(n, _)| *n == child).unwrap_or(0);
                let mut cycle: Vec<String> =
                    path[start..].iter().map(|(n, _)| n.to_string()).collect();
                cycle.push(child.to_string());
                return Some(cycle);
            }
            if visited.insert(child) {
                on_path.insert(child);
                path.push((child, 0));
            }
        }
        None
    }

    /// Post-order walk from `root`; nodes outside the graph are leaves
    fn topological_order<'a>(&'a self, root: &'a str) -> Vec<String> {
        let mut order = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        post_order(
            root,
            |node| {
                self.graph
                    .get(node)
                    .map(|deps| deps.iter().map(|d| d.plugin_name.as_str()).collect())
                    .unwrap_or_default()
            },
            &mut visited,
            &mut order,
        );
        order
    }

    fn validate_versions(
        &self,
        registry: &PluginRegistry,
        order: &[String],
    ) -> Result<(), DependencyError> {
        let in_order: HashSet<&str> = order.iter().map(String::as_str).collect();

        for requirer in order {
            let Some(deps) = self.graph.get(requirer) else {
                continue;
            };
            for dep in deps {
                let Some(constraint) = &dep.version_range else {
                    continue;
                };
                if !in_order.contains(dep.plugin_name.as_str()) {
                    continue;
                }
                let available = registry
                    .version_of(&dep.plugin_name)
                    .unwrap_or(DEFAULT_PLUGIN_VERSION);
                if !constraint.matches(available)? {
                    return Err(DependencyError::VersionConflict {
                        plugin: requirer.clone(),
                        dependency: dep.plugin_name.clone(),
                        required: constraint.to_string(),
                        available: available.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Topologically order `names` using only registry edges that stay inside the set
fn order_within(registry: &PluginRegistry, names: &[String], skip_optional: bool) -> Vec<String> {
    let members: HashSet<&str> = names.iter().map(String::as_str).collect();
    let edges: HashMap<&str, Vec<&str>> = names
        .iter()
        .map(|name| {
            let deps = registry
                .get_plugin(name)
                .map(|manifest| {
                    manifest
                        .dependencies
                        .iter()
                        .filter(|dep| !(skip_optional && dep.is_optional()))
                        .map(|dep| dep.plugin_name.as_str())
                        .filter(|dep| members.contains(dep))
                        .collect()
                })
                .unwrap_or_default();
            (name.as_str(), deps)
        })
        .collect();

    let mut order = Vec::with_capacity(names.len());
    let mut visited = HashSet::new();
    for name in names {
        post_order(
            name,
            |node| edges.get(node).cloned().unwrap_or_default(),
            &mut visited,
            &mut order,
        );
    }
    order
}

/// Iterative depth-first post-order from `root`, children in the order given.
/// Nodes already in `visited` are skipped.
fn post_order<'a, F>(
    root: &'a str,
    children: F,
    visited: &mut HashSet<&'a str>,
    order: &mut Vec<String>,
) where
    F: Fn(&'a str) -> Vec<&'a str>,
{
    if !visited.insert(root) {
        return;
    }
    let mut frames: Vec<(&'a str, Vec<&'a str>, usize)> = vec![(root, children(root), 0)];

    while let Some(frame) = frames.last_mut() {
        match frame.1.get(frame.2).copied() {
            Some(child) => {
                frame.2 += 1;
                if visited.insert(child) {
                    frames.push((child, children(child), 0));
                }
            }
            None => {
                order.push(frame.0.to_string());
                frames.pop();
            }
        }
    }
}

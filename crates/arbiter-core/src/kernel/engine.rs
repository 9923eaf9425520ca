use std::path::Path;

use log::{debug, info};

use crate::config::EngineConfig;
use crate::event::{default_reporter, EngineEvent, SharedReporter};
use crate::kernel::constants;
use crate::kernel::error::Result;
use crate::plugin_system::conflict::{
    ConflictReport, ConflictResolution, ConflictResolver, ConflictStrategy, ConflictType,
    ResolvedConflict, StrategyOverrides,
};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::error_handler::{
    ErrorContext, ErrorHandler, ErrorStatistics, PluginFailure, RecoveryAction,
};
use crate::plugin_system::manifest::PluginManifest;
use crate::plugin_system::namespace::NamespaceAllocator;
use crate::plugin_system::priority::PriorityRegistry;
use crate::plugin_system::registry::PluginRegistry;
use crate::plugin_system::resolver::{DependencyResolver, ResolveOptions};

/// Result of [`Engine::load_order`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Plugins to load, dependencies first
    Ready(Vec<String>),
    /// Resolution failed and the error handler chose this recovery
    Recovered(RecoveryAction),
}

/// Wires the resolver, conflict resolver and error handler around one
/// registry snapshot and one configuration.
pub struct Engine {
    registry: PluginRegistry,
    config: EngineConfig,
    reporter: SharedReporter,
    resolver: DependencyResolver,
    conflicts: ConflictResolver,
    errors: ErrorHandler,
}

impl Engine {
    /// Creates an engine reporting through the `log` facade.
    pub fn new(registry: PluginRegistry, config: EngineConfig) -> Result<Self> {
        Self::with_reporter(registry, config, default_reporter())
    }

    /// Creates an engine from a configuration file.
    pub fn from_config_file(registry: PluginRegistry, path: &Path) -> Result<Self> {
        let config = EngineConfig::from_file(path)?;
        let reporter = default_reporter();
        reporter.report(&EngineEvent::ConfigLoaded {
            source: path.display().to_string(),
        });
        Self::with_reporter(registry, config, reporter)
    }

    pub fn with_reporter(
        registry: PluginRegistry,
        config: EngineConfig,
        reporter: SharedReporter,
    ) -> Result<Self> {
        info!(
            "Initializing {} v{} with {} plugins",
            constants::ENGINE_NAME,
            constants::ENGINE_VERSION,
            registry.len()
        );
        config.validate()?;

        let mut priorities = PriorityRegistry::with_rules(config.detection.clone());
        for manifest in registry.iter() {
            priorities.set_priority_with_auto_detection(&manifest.name, manifest);
        }
        for (plugin, tier) in config.priority_overrides()? {
            priorities.set_priority(&plugin, tier);
        }

        let mut resolver = DependencyResolver::with_reporter(reporter.clone());
        resolver.set_strategy(config.strategy_kind()?);
        resolver.set_check_versions(config.check_versions);

        let mut conflicts = ConflictResolver::with_components(
            priorities,
            NamespaceAllocator::new(config.similarity_threshold),
            reporter.clone(),
        );
        for (conflict_type, strategy) in config.conflict_strategy_overrides()? {
            conflicts.set_default_strategy(conflict_type, strategy);
        }

        let mut errors = ErrorHandler::with_reporter(
            config.max_retries,
            config.retry_base_delay(),
            reporter.clone(),
        );
        errors.set_known_plugins(registry.names());
        for (plugin, fallback) in &config.fallbacks {
            errors.register_fallback(plugin, Some(fallback));
        }

        Ok(Self {
            registry,
            config,
            reporter,
            resolver,
            conflicts,
            errors,
        })
    }

    /// Add a plugin after construction. Cached resolutions are dropped.
    pub fn register_plugin(&mut self, manifest: PluginManifest) -> Result<()> {
        let name = manifest.name.clone();
        let explicit = self.config.priority_overrides()?;
        self.registry.register_plugin(manifest)?;

        match explicit.into_iter().find(|(plugin, _)| *plugin == name) {
            Some((_, tier)) => self.conflicts.priorities_mut().set_priority(&name, tier),
            None => {
                if let Some(manifest) = self.registry.get_plugin(&name) {
                    self.conflicts
                        .priorities_mut()
                        .set_priority_with_auto_detection(&name, manifest);
                }
            }
        }

        self.errors.set_known_plugins(self.registry.names());
        self.resolver.clear_cache();
        debug!("Plugin {} registered with the engine", name);
        Ok(())
    }

    /// Load order for `name`, version constraints checked as configured
    pub fn resolve(&mut self, name: &str) -> Result<Vec<String>> {
        let options = ResolveOptions {
            check_versions: self.config.check_versions,
            skip_optional: false,
        };
        Ok(self.resolver.resolve(&self.registry, name, options)?)
    }

    /// Load order for `name` through the configured strategy
    pub fn resolve_with_strategy(&mut self, name: &str) -> Result<Vec<String>> {
        Ok(self.resolver.resolve_with_strategy(&self.registry, name)?)
    }

    pub fn resolve_multiple<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<String>> {
        let options = ResolveOptions {
            check_versions: self.config.check_versions,
            skip_optional: false,
        };
        Ok(self.resolver.resolve_multiple(&self.registry, names, options)?)
    }

    pub fn dependencies_satisfied(&self, name: &str) -> bool {
        self.resolver.dependencies_satisfied(&self.registry, name)
    }

    pub fn missing_dependencies(&self, name: &str) -> Vec<String> {
        self.resolver.missing_dependencies(&self.registry, name)
    }

    /// Resolve `name` for loading.
    ///
    /// Disabled plugins (the root or any dependency) are refused up front.
    /// Resolution failures are classified by the error handler; fail-fast
    /// failures come back as errors, every other recovery as
    /// [`LoadOutcome::Recovered`].
    pub fn load_order(&mut self, name: &str) -> Result<LoadOutcome> {
        self.errors.ensure_loadable(name)?;

        match self.resolver.resolve_with_strategy(&self.registry, name) {
            Ok(order) => {
                if let Some(disabled) = order.iter().find(|p| self.errors.is_plugin_disabled(p)) {
                    return Err(PluginSystemError::PluginDisabled(disabled.clone()).into());
                }
                Ok(LoadOutcome::Ready(order))
            }
            Err(err) => {
                let context = ErrorContext::for_plugin(name).with_operation("resolve");
                let action = self
                    .errors
                    .handle_error(PluginFailure::from(err), &context)?;
                Ok(LoadOutcome::Recovered(action))
            }
        }
    }

    pub fn detect_conflicts(&mut self) -> ConflictReport {
        self.conflicts.detect_conflicts(&self.registry)
    }

    pub fn resolve_conflict(
        &mut self,
        conflict_type: &ConflictType,
        plugins: &[String],
        strategy: Option<ConflictStrategy>,
    ) -> ConflictResolution {
        self.conflicts.resolve_conflict(conflict_type, plugins, strategy)
    }

    pub fn resolve_all_conflicts(
        &mut self,
        report: &ConflictReport,
        overrides: &StrategyOverrides,
    ) -> Vec<ResolvedConflict> {
        self.conflicts.resolve_all_conflicts(report, overrides)
    }

    pub fn handle_error(
        &mut self,
        failure: PluginFailure,
        context: &ErrorContext,
    ) -> std::result::Result<RecoveryAction, PluginFailure> {
        self.errors.handle_error(failure, context)
    }

    pub fn register_fallback(&mut self, plugin: &str, fallback: Option<&str>) {
        self.errors.register_fallback(plugin, fallback);
    }

    pub fn error_statistics(&self) -> ErrorStatistics {
        self.errors.error_statistics()
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reporter(&self) -> &SharedReporter {
        &self.reporter
    }

    pub fn priorities(&self) -> &PriorityRegistry {
        self.conflicts.priorities()
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut DependencyResolver {
        &mut self.resolver
    }

    pub fn conflicts(&self) -> &ConflictResolver {
        &self.conflicts
    }

    pub fn conflicts_mut(&mut self) -> &mut ConflictResolver {
        &mut self.conflicts
    }

    pub fn errors(&self) -> &ErrorHandler {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorHandler {
        &mut self.errors
    }
}

//! # Plugin Failure Recovery
//!
//! [`ErrorHandler`] turns a plugin failure into a [`RecoveryAction`]: retry
//! with exponential backoff, substitute a fallback plugin, disable the
//! offender, keep going, or hand the failure back to the caller. It owns the
//! per-plugin retry counters, the disabled set and an append-only error log.
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{default_reporter, EngineEvent, SharedReporter};
use crate::kernel::constants::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY_MS, UNKNOWN_PLUGIN};
use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::error::PluginSystemError;

/// Classes of plugin failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The plugin could not be loaded
    Load,
    /// A referenced symbol does not exist
    MissingSymbol,
    /// A referenced method does not exist
    MissingMethod,
    /// The plugin was called with bad input
    InvalidArgument,
    CircularDependency,
    UnresolvedDependency,
    VersionConflict,
    Other,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Load => "load",
            FailureKind::MissingSymbol => "missing_symbol",
            FailureKind::MissingMethod => "missing_method",
            FailureKind::InvalidArgument => "invalid_argument",
            FailureKind::CircularDependency => "circular_dependency",
            FailureKind::UnresolvedDependency => "unresolved_dependency",
            FailureKind::VersionConflict => "version_conflict",
            FailureKind::Other => "other",
        }
    }

    /// Recovery used when the context does not ask for one
    pub fn default_recovery(&self) -> RecoveryStrategy {
        match self {
            FailureKind::Load => RecoveryStrategy::Fallback,
            FailureKind::MissingSymbol | FailureKind::MissingMethod => RecoveryStrategy::Disable,
            FailureKind::InvalidArgument => RecoveryStrategy::FailFast,
            FailureKind::CircularDependency => RecoveryStrategy::FailFast,
            FailureKind::UnresolvedDependency => RecoveryStrategy::Disable,
            FailureKind::VersionConflict => RecoveryStrategy::Fallback,
            FailureKind::Other => RecoveryStrategy::LogContinue,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure raised by or on behalf of a plugin
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct PluginFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl PluginFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<DependencyError> for PluginFailure {
    fn from(err: DependencyError) -> Self {
        let kind = match &err {
            DependencyError::CircularDependency { .. } => FailureKind::CircularDependency,
            DependencyError::UnresolvedDependency { .. } => FailureKind::UnresolvedDependency,
            DependencyError::VersionConflict { .. } => FailureKind::VersionConflict,
            DependencyError::PluginNotFound(_) | DependencyError::Version(_) => {
                FailureKind::InvalidArgument
            }
        };
        PluginFailure::new(kind, err.to_string())
    }
}

/// How to react to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    Retry,
    Fallback,
    Disable,
    FailFast,
    LogContinue,
}

impl RecoveryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategy::Retry => "retry",
            RecoveryStrategy::Fallback => "fallback",
            RecoveryStrategy::Disable => "disable",
            RecoveryStrategy::FailFast => "fail_fast",
            RecoveryStrategy::LogContinue => "log_continue",
        }
    }
}

impl fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecoveryStrategy {
    type Err = PluginSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "retry" => Ok(RecoveryStrategy::Retry),
            "fallback" => Ok(RecoveryStrategy::Fallback),
            "disable" => Ok(RecoveryStrategy::Disable),
            "fail_fast" => Ok(RecoveryStrategy::FailFast),
            "log_continue" => Ok(RecoveryStrategy::LogContinue),
            other => Err(PluginSystemError::InvalidStrategy(format!(
                "Unknown recovery strategy: {}",
                other
            ))),
        }
    }
}

/// Where a failure happened and how the caller wants it handled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorContext {
    pub plugin: Option<String>,
    pub operation: Option<String>,
    /// Explicit recovery, overrides the classification table
    pub recovery: Option<RecoveryStrategy>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_plugin(plugin: &str) -> Self {
        Self {
            plugin: Some(plugin.to_string()),
            ..Self::default()
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryStrategy) -> Self {
        self.recovery = Some(recovery);
        self
    }
}

/// Outcome of [`ErrorHandler::handle_error`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Try again after `delay`; `attempt` is 1-based
    Retry { plugin: String, delay: Duration, attempt: u32 },
    /// Use `fallback` instead of `plugin`
    Fallback { plugin: String, fallback: String },
    Disable { plugin: String },
    /// Nothing to disable, skip the operation
    Skip,
    Continue,
}

impl RecoveryAction {
    pub fn name(&self) -> &'static str {
        match self {
            RecoveryAction::Retry { .. } => "retry",
            RecoveryAction::Fallback { .. } => "fallback",
            RecoveryAction::Disable { .. } => "disable",
            RecoveryAction::Skip => "skip",
            RecoveryAction::Continue => "continue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorLogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: FailureKind,
    pub message: String,
    pub context: ErrorContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorStatistics {
    pub total_errors: usize,
    pub errors_by_plugin: BTreeMap<String, usize>,
    pub errors_by_kind: BTreeMap<String, usize>,
    pub disabled_plugins: Vec<String>,
    pub recovery_attempts: BTreeMap<String, u32>,
}

pub type CallbackResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Observer invoked for every handled failure
pub type ErrorCallback = Box<dyn Fn(&PluginFailure, &ErrorContext) -> CallbackResult + Send>;

/// Classifies plugin failures and tracks per-plugin error state.
pub struct ErrorHandler {
    max_retries: u32,
    retry_base_delay: Duration,
    error_log: Vec<ErrorLogEntry>,
    recovery_attempts: HashMap<String, u32>,
    fallbacks: HashMap<String, String>,
    disabled: BTreeSet<String>,
    /// Plugins a fallback may point at; `None` accepts any name
    known_plugins: Option<HashSet<String>>,
    callbacks: Vec<ErrorCallback>,
    reporter: SharedReporter,
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        )
    }
}

impl ErrorHandler {
    pub fn new(max_retries: u32, retry_base_delay: Duration) -> Self {
        Self::with_reporter(max_retries, retry_base_delay, default_reporter())
    }

    pub fn with_reporter(
        max_retries: u32,
        retry_base_delay: Duration,
        reporter: SharedReporter,
    ) -> Self {
        Self {
            max_retries,
            retry_base_delay,
            error_log: Vec::new(),
            recovery_attempts: HashMap::new(),
            fallbacks: HashMap::new(),
            disabled: BTreeSet::new(),
            known_plugins: None,
            callbacks: Vec::new(),
            reporter,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Log `failure` and decide what to do about it.
    ///
    /// `Err` is returned only for fail-fast handling and carries the original
    /// failure unchanged.
    pub fn handle_error(
        &mut self,
        failure: PluginFailure,
        context: &ErrorContext,
    ) -> Result<RecoveryAction, PluginFailure> {
        self.log_error(&failure, context);
        let kind = failure.kind;

        let result = match context.plugin.as_deref() {
            Some(plugin) if self.disabled.contains(plugin) => {
                warn!("Plugin {} is already disabled", plugin);
                Ok(RecoveryAction::Disable {
                    plugin: plugin.to_string(),
                })
            }
            _ => {
                let strategy = self.determine_strategy(&failure, context);
                self.execute(strategy, failure, context)
            }
        };

        self.reporter.report(&EngineEvent::ErrorHandled {
            plugin_id: context.plugin.clone(),
            kind: kind.to_string(),
            action: match &result {
                Ok(action) => action.name().to_string(),
                Err(_) => RecoveryStrategy::FailFast.to_string(),
            },
        });
        result
    }

    fn determine_strategy(&self, failure: &PluginFailure, context: &ErrorContext) -> RecoveryStrategy {
        if let Some(explicit) = context.recovery {
            return explicit;
        }

        let strategy = failure.kind.default_recovery();
        match context.plugin.as_deref() {
            Some(plugin) if self.attempts(plugin) >= self.max_retries => RecoveryStrategy::FailFast,
            _ => strategy,
        }
    }

    fn execute(
        &mut self,
        strategy: RecoveryStrategy,
        failure: PluginFailure,
        context: &ErrorContext,
    ) -> Result<RecoveryAction, PluginFailure> {
        match strategy {
            RecoveryStrategy::Retry => self.retry_with_backoff(failure, context),
            RecoveryStrategy::Fallback => Ok(self.use_fallback(context)),
            RecoveryStrategy::Disable => Ok(self.disable(context)),
            RecoveryStrategy::FailFast => Err(failure),
            RecoveryStrategy::LogContinue => {
                warn!(
                    "Continuing despite error in plugin {}: {}",
                    context.plugin.as_deref().unwrap_or(UNKNOWN_PLUGIN),
                    failure.message
                );
                Ok(RecoveryAction::Continue)
            }
        }
    }

    fn retry_with_backoff(
        &mut self,
        failure: PluginFailure,
        context: &ErrorContext,
    ) -> Result<RecoveryAction, PluginFailure> {
        let Some(plugin) = context.plugin.as_deref() else {
            return Err(failure);
        };

        let attempt = self.attempts(plugin);
        if attempt < self.max_retries {
            self.recovery_attempts.insert(plugin.to_string(), attempt + 1);
            let delay = self
                .retry_base_delay
                .saturating_mul(2u32.saturating_pow(attempt));
            info!(
                "Retrying plugin {} after {:?} (attempt {}/{})",
                plugin,
                delay,
                attempt + 1,
                self.max_retries
            );
            Ok(RecoveryAction::Retry {
                plugin: plugin.to_string(),
                delay,
                attempt: attempt + 1,
            })
        } else {
            error!("Max retries reached for plugin {}, disabling", plugin);
            Ok(self.disable(context))
        }
    }

    fn use_fallback(&mut self, context: &ErrorContext) -> RecoveryAction {
        let Some(plugin) = context.plugin.as_deref() else {
            return self.disable(context);
        };

        match self.fallbacks.get(plugin) {
            Some(fallback) if self.fallback_usable(fallback) => {
                info!("Using fallback plugin {} for {}", fallback, plugin);
                RecoveryAction::Fallback {
                    plugin: plugin.to_string(),
                    fallback: fallback.clone(),
                }
            }
            _ => {
                warn!("No fallback available for {}, disabling", plugin);
                self.disable(context)
            }
        }
    }

    fn disable(&mut self, context: &ErrorContext) -> RecoveryAction {
        let Some(plugin) = context.plugin.as_deref() else {
            return RecoveryAction::Skip;
        };

        self.disabled.insert(plugin.to_string());
        warn!("Plugin {} has been disabled due to errors", plugin);
        self.reporter.report(&EngineEvent::PluginDisabled {
            plugin_id: plugin.to_string(),
        });
        RecoveryAction::Disable {
            plugin: plugin.to_string(),
        }
    }

    fn log_error(&mut self, failure: &PluginFailure, context: &ErrorContext) {
        error!(
            "{} (Plugin: {})",
            failure,
            context.plugin.as_deref().unwrap_or(UNKNOWN_PLUGIN)
        );

        self.error_log.push(ErrorLogEntry {
            timestamp: Utc::now(),
            kind: failure.kind,
            message: failure.message.clone(),
            context: context.clone(),
        });

        for callback in &self.callbacks {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(failure, context))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("Error callback failed: {}", err),
                Err(_) => error!("Error callback failed: callback panicked"),
            }
        }
    }

    fn fallback_usable(&self, fallback: &str) -> bool {
        !self.disabled.contains(fallback)
            && self
                .known_plugins
                .as_ref()
                .is_none_or(|known| known.contains(fallback))
    }

    fn attempts(&self, plugin: &str) -> u32 {
        self.recovery_attempts.get(plugin).copied().unwrap_or(0)
    }

    /// Substitute used when `plugin` fails; `None` removes it
    pub fn register_fallback(&mut self, plugin: &str, fallback: Option<&str>) {
        match fallback {
            Some(fallback) => {
                self.fallbacks.insert(plugin.to_string(), fallback.to_string());
            }
            None => {
                self.fallbacks.remove(plugin);
            }
        }
    }

    /// Restrict fallbacks to registered plugins
    pub fn set_known_plugins<I, S>(&mut self, plugins: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_plugins = Some(plugins.into_iter().map(Into::into).collect());
    }

    pub fn fallback_for(&self, plugin: &str) -> Option<&str> {
        self.fallbacks.get(plugin).map(String::as_str)
    }

    /// Register an observer for every handled failure
    pub fn on_error<F>(&mut self, callback: F)
    where
        F: Fn(&PluginFailure, &ErrorContext) -> CallbackResult + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    pub fn is_plugin_disabled(&self, plugin: &str) -> bool {
        self.disabled.contains(plugin)
    }

    /// `Err(PluginDisabled)` if `plugin` was disabled by an earlier failure
    pub fn ensure_loadable(&self, plugin: &str) -> Result<(), PluginSystemError> {
        if self.is_plugin_disabled(plugin) {
            return Err(PluginSystemError::PluginDisabled(plugin.to_string()));
        }
        Ok(())
    }

    /// Re-enable `plugin` and reset its retry counter
    pub fn enable_plugin(&mut self, plugin: &str) {
        let was_disabled = self.disabled.remove(plugin);
        self.recovery_attempts.insert(plugin.to_string(), 0);
        if was_disabled {
            info!("Plugin {} re-enabled", plugin);
            self.reporter.report(&EngineEvent::PluginEnabled {
                plugin_id: plugin.to_string(),
            });
        }
    }

    /// Drop the error log, retry counters and disabled set
    pub fn clear_errors(&mut self) {
        self.error_log.clear();
        self.recovery_attempts.clear();
        self.disabled.clear();
    }

    pub fn error_log(&self) -> &[ErrorLogEntry] {
        &self.error_log
    }

    pub fn error_statistics(&self) -> ErrorStatistics {
        let mut errors_by_plugin = BTreeMap::new();
        let mut errors_by_kind = BTreeMap::new();
        for entry in &self.error_log {
            let plugin = entry
                .context
                .plugin
                .clone()
                .unwrap_or_else(|| UNKNOWN_PLUGIN.to_string());
            *errors_by_plugin.entry(plugin).or_insert(0) += 1;
            *errors_by_kind.entry(entry.kind.to_string()).or_insert(0) += 1;
        }

        ErrorStatistics {
            total_errors: self.error_log.len(),
            errors_by_plugin,
            errors_by_kind,
            disabled_plugins: self.disabled.iter().cloned().collect(),
            recovery_attempts: self
                .recovery_attempts
                .iter()
                .map(|(plugin, attempts)| (plugin.clone(), *attempts))
                .collect(),
        }
    }

    /// Block for the delay of a retry action; other actions return at once
    pub fn wait(action: &RecoveryAction) {
        if let RecoveryAction::Retry { delay, .. } = action {
            std::thread::sleep(*delay);
        }
    }
}

/// Plain-text summary of an [`ErrorHandler`]'s state
pub struct ErrorReport;

impl ErrorReport {
    pub fn generate(handler: &ErrorHandler) -> String {
        let stats = handler.error_statistics();
        let mut lines = vec!["Plugin Error Report".to_string(), "=".repeat(50)];
        lines.push(format!("Total Errors: {}", stats.total_errors));
        lines.push(String::new());

        if !stats.errors_by_plugin.is_empty() {
            lines.push("Errors by Plugin:".to_string());
            for (plugin, count) in &stats.errors_by_plugin {
                lines.push(format!("  {}: {} errors", plugin, count));
            }
            lines.push(String::new());
        }

        if !stats.errors_by_kind.is_empty() {
            lines.push("Errors by Type:".to_string());
            for (kind, count) in &stats.errors_by_kind {
                lines.push(format!("  {}: {} occurrences", kind, count));
            }
            lines.push(String::new());
        }

        if !stats.disabled_plugins.is_empty() {
            lines.push("Disabled Plugins:".to_string());
            for plugin in &stats.disabled_plugins {
                lines.push(format!("  - {}", plugin));
            }
            lines.push(String::new());
        }

        lines.push("Recovery Attempts:".to_string());
        for (plugin, attempts) in &stats.recovery_attempts {
            lines.push(format!("  {}: {} retries", plugin, attempts));
        }

        lines.join("\n")
    }
}

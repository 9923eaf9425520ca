use std::fmt;

use log::Level;

/// Events emitted by the engine's components
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Dependency resolution is starting for a root plugin
    ResolutionStarted { plugin_id: String },
    /// Resolution produced a load order
    ResolutionCompleted { plugin_id: String, order: Vec<String>, cached: bool },
    /// Resolution failed
    ResolutionFailed { plugin_id: String, reason: String },
    /// A command, method or namespace collision was found
    ConflictDetected { kind: String, name: String, plugins: Vec<String> },
    /// A conflict was resolved (or refused) with the given strategy
    ConflictResolved { conflict_type: String, strategy: String, success: bool, winner: Option<String> },
    /// The error handler classified a failure
    ErrorHandled { plugin_id: Option<String>, kind: String, action: String },
    /// A plugin was disabled after a failure
    PluginDisabled { plugin_id: String },
    /// A previously disabled plugin was re-enabled
    PluginEnabled { plugin_id: String },
    /// Configuration was loaded from a string or file
    ConfigLoaded { source: String },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::ResolutionStarted { .. } => "resolution.started",
            EngineEvent::ResolutionCompleted { .. } => "resolution.completed",
            EngineEvent::ResolutionFailed { .. } => "resolution.failed",
            EngineEvent::ConflictDetected { .. } => "conflict.detected",
            EngineEvent::ConflictResolved { .. } => "conflict.resolved",
            EngineEvent::ErrorHandled { .. } => "error.handled",
            EngineEvent::PluginDisabled { .. } => "plugin.disabled",
            EngineEvent::PluginEnabled { .. } => "plugin.enabled",
            EngineEvent::ConfigLoaded { .. } => "config.loaded",
        }
    }

    /// Log level the event is reported at
    pub fn severity(&self) -> Level {
        match self {
            EngineEvent::ResolutionStarted { .. } => Level::Debug,
            EngineEvent::ResolutionCompleted { .. } => Level::Debug,
            EngineEvent::ResolutionFailed { .. } => Level::Error,
            EngineEvent::ConflictDetected { .. } => Level::Warn,
            EngineEvent::ConflictResolved { success: true, .. } => Level::Info,
            EngineEvent::ConflictResolved { success: false, .. } => Level::Warn,
            EngineEvent::ErrorHandled { .. } => Level::Warn,
            EngineEvent::PluginDisabled { .. } => Level::Warn,
            EngineEvent::PluginEnabled { .. } => Level::Info,
            EngineEvent::ConfigLoaded { .. } => Level::Info,
        }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::ResolutionStarted { plugin_id } => {
                write!(f, "Resolving dependencies for {}", plugin_id)
            }
            EngineEvent::ResolutionCompleted { plugin_id, order, cached } => write!(
                f,
                "Resolved {} -> [{}]{}",
                plugin_id,
                order.join(", "),
                if *cached { " (cached)" } else { "" }
            ),
            EngineEvent::ResolutionFailed { plugin_id, reason } => {
                write!(f, "Resolution of {} failed: {}", plugin_id, reason)
            }
            EngineEvent::ConflictDetected { kind, name, plugins } => write!(
                f,
                "{} conflict '{}' between {}",
                kind,
                name,
                plugins.join(", ")
            ),
            EngineEvent::ConflictResolved { conflict_type, strategy, success, winner } => {
                write!(f, "{} conflict resolved with {}", conflict_type, strategy)?;
                if let Some(winner) = winner {
                    write!(f, ", winner {}", winner)?;
                }
                if !success {
                    write!(f, " (unsuccessful)")?;
                }
                Ok(())
            }
            EngineEvent::ErrorHandled { plugin_id, kind, action } => write!(
                f,
                "{} error in {} handled with {}",
                kind,
                plugin_id.as_deref().unwrap_or("<none>"),
                action
            ),
            EngineEvent::PluginDisabled { plugin_id } => write!(f, "Plugin {} disabled", plugin_id),
            EngineEvent::PluginEnabled { plugin_id } => write!(f, "Plugin {} enabled", plugin_id),
            EngineEvent::ConfigLoaded { source } => write!(f, "Configuration loaded from {}", source),
        }
    }
}

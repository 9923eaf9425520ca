#![cfg(test)]

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::kernel::engine::LoadOutcome;
use crate::kernel::error::Error;
use crate::plugin_system::conflict::{ConflictKind, ConflictStrategy, ConflictType, StrategyOverrides};
use crate::plugin_system::error_handler::{
    ErrorContext, FailureKind, PluginFailure, RecoveryAction, RecoveryStrategy,
};
use crate::plugin_system::manifest::PluginManifest;
use crate::plugin_system::priority::PriorityTier;

use super::common::{ecosystem, manifest, setup_engine};

#[test]
fn test_ecosystem_priorities() {
    let (engine, _) = setup_engine(ecosystem(), EngineConfig::default());
    let priorities = engine.priorities();

    assert_eq!(priorities.get_priority("Arbiter::Io"), PriorityTier::Core);
    assert_eq!(priorities.get_priority("Arbiter::Summary"), PriorityTier::Official);
    assert_eq!(priorities.get_priority("regression"), PriorityTier::ThirdParty);
    assert_eq!(priorities.get_priority("plotting"), PriorityTier::ThirdParty);
    assert_eq!(priorities.get_priority("summary"), PriorityTier::Local);
}

#[test]
fn test_load_order_includes_optional_dependencies() {
    let (mut engine, reporter) = setup_engine(ecosystem(), EngineConfig::default());

    let outcome = engine.load_order("regression").unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Ready(vec![
            "Arbiter::Io".to_string(),
            "Arbiter::Summary".to_string(),
            "plotting".to_string(),
            "regression".to_string(),
        ])
    );

    // Second request is served from the cache
    engine.load_order("regression").unwrap();
    let cached: Vec<bool> = reporter
        .events()
        .into_iter()
        .filter_map(|event| match event {
            crate::event::EngineEvent::ResolutionCompleted { cached, .. } => Some(cached),
            _ => None,
        })
        .collect();
    assert_eq!(cached, vec![false, true]);
}

#[test]
fn test_minimal_strategy_skips_optional_dependencies() {
    let config = EngineConfig {
        strategy: "minimal".to_string(),
        ..EngineConfig::default()
    };
    let (mut engine, _) = setup_engine(ecosystem(), config);

    assert_eq!(
        engine.resolve_with_strategy("regression").unwrap(),
        vec!["Arbiter::Io", "Arbiter::Summary", "regression"]
    );
    // The plain resolver still follows optional edges
    assert!(engine.resolve("regression").unwrap().contains(&"plotting".to_string()));
}

#[test]
fn test_merged_load_order_for_several_roots() {
    let (mut engine, _) = setup_engine(ecosystem(), EngineConfig::default());
    let order = engine.resolve_multiple(&["summary", "plotting"]).unwrap();

    assert_eq!(order.len(), 3);
    assert_eq!(order[0], "Arbiter::Io");
    assert!(order.contains(&"summary".to_string()));
    assert!(order.contains(&"plotting".to_string()));
}

#[test]
fn test_detect_and_resolve_ecosystem_conflicts() {
    let (mut engine, reporter) = setup_engine(ecosystem(), EngineConfig::default());
    let report = engine.detect_conflicts();

    assert_eq!(report.command_conflicts.len(), 1);
    assert_eq!(report.command_conflicts[0].name, "describe");
    assert_eq!(report.method_conflicts.len(), 1);
    assert_eq!(report.method_conflicts[0].name, "mean");
    assert_eq!(
        reporter.event_names().iter().filter(|n| **n == "conflict.detected").count(),
        report.len()
    );

    // A command-name conflict is settled by priority with a warning
    let resolution = engine.resolve_conflict(
        &ConflictType::CommandName,
        &report.command_conflicts[0].plugins,
        None,
    );
    assert!(resolution.success);
    assert_eq!(resolution.strategy, ConflictStrategy::WarnOverride);
    assert_eq!(resolution.winner.as_deref(), Some("Arbiter::Summary"));
    assert_eq!(resolution.losers, vec!["summary".to_string()]);
    assert_eq!(resolution.warnings.len(), 1);

    // Statistics methods are namespaced by default
    let resolution = engine.resolve_conflict(
        &ConflictType::StatisticsMethod,
        &report.method_conflicts[0].plugins,
        None,
    );
    assert_eq!(resolution.strategy, ConflictStrategy::Namespace);
    assert_eq!(
        resolution.namespaced_plugins.get("summary").map(String::as_str),
        Some("lo_summary")
    );
    assert_eq!(
        resolution.namespaced_plugins.get("Arbiter::Summary").map(String::as_str),
        Some("of_arbiter_summary")
    );
}

#[test]
fn test_resolve_all_conflicts_with_overrides() {
    let (mut engine, _) = setup_engine(ecosystem(), EngineConfig::default());
    let report = engine.detect_conflicts();

    let strict = StrategyOverrides::new().with_global(ConflictStrategy::Strict);
    let results = engine.resolve_all_conflicts(&report, &strict);
    assert_eq!(results.len(), report.len());
    assert!(results.iter().all(|r| !r.resolution.success));

    let mixed = StrategyOverrides::new()
        .with_kind(ConflictKind::Command, ConflictStrategy::SilentOverride)
        .with_global(ConflictStrategy::Namespace);
    let results = engine.resolve_all_conflicts(&report, &mixed);
    for result in &results {
        let expected = match result.conflict.kind {
            ConflictKind::Command => ConflictStrategy::SilentOverride,
            _ => ConflictStrategy::Namespace,
        };
        assert_eq!(result.strategy, expected);
        assert!(result.resolution.success);
    }
}

#[test]
fn test_version_conflict_recovers_through_configured_fallback() {
    let mut exporter = PluginManifest::new("exporter", "1.0");
    exporter.add_dependency("Arbiter::Io", Some(">= 3.0"));
    let mut manifests = ecosystem();
    manifests.push(exporter);

    let config = EngineConfig {
        fallbacks: BTreeMap::from([("exporter".to_string(), "plotting".to_string())]),
        ..EngineConfig::default()
    };
    let (mut engine, reporter) = setup_engine(manifests, config);

    assert_eq!(
        engine.load_order("exporter").unwrap(),
        LoadOutcome::Recovered(RecoveryAction::Fallback {
            plugin: "exporter".into(),
            fallback: "plotting".into(),
        })
    );
    assert!(reporter.event_names().contains(&"resolution.failed"));
    assert!(reporter.event_names().contains(&"error.handled"));

    let stats = engine.error_statistics();
    assert_eq!(stats.errors_by_plugin.get("exporter"), Some(&1));
    assert_eq!(stats.errors_by_kind.get("version_conflict"), Some(&1));
    assert!(stats.disabled_plugins.is_empty());
}

#[test]
fn test_retry_ladder_ends_in_disable() {
    let config = EngineConfig {
        max_retries: 2,
        retry_base_delay_ms: 10,
        ..EngineConfig::default()
    };
    let (mut engine, _) = setup_engine(ecosystem(), config);
    let context = ErrorContext::for_plugin("plotting").with_recovery(RecoveryStrategy::Retry);
    let failure = || PluginFailure::new(FailureKind::Load, "backend unavailable");

    let mut actions = Vec::new();
    for _ in 0..3 {
        actions.push(engine.handle_error(failure(), &context).unwrap());
    }
    assert_eq!(
        actions,
        vec![
            RecoveryAction::Retry {
                plugin: "plotting".into(),
                delay: Duration::from_millis(10),
                attempt: 1,
            },
            RecoveryAction::Retry {
                plugin: "plotting".into(),
                delay: Duration::from_millis(20),
                attempt: 2,
            },
            RecoveryAction::Disable { plugin: "plotting".into() },
        ]
    );

    // regression pulls in plotting, which is now disabled
    assert!(matches!(
        engine.load_order("regression"),
        Err(Error::PluginSystem(_))
    ));
}

#[test]
fn test_unknown_root_is_reported_through_error_handler() {
    let (mut engine, _) = setup_engine(vec![manifest("a", "1.0", &[])], EngineConfig::default());
    // PluginNotFound is an invalid argument and fails fast
    assert!(engine.load_order("ghost").is_err());
    assert_eq!(engine.error_statistics().total_errors, 1);
}

#[cfg(feature = "yaml-config")]
#[test]
fn test_engine_from_yaml_file() {
    use std::fs;
    use tempfile::tempdir;

    use crate::kernel::engine::Engine;

    use super::common::registry;

    let dir = tempdir().unwrap();
    let path = dir.path().join("arbiter.yaml");
    fs::write(
        &path,
        "strategy: minimal\nconflict_strategies:\n  command_name: strict\npriorities:\n  summary: development\n",
    )
    .unwrap();

    let mut engine = Engine::from_config_file(registry(ecosystem()), &path).unwrap();
    assert_eq!(engine.priorities().get_priority("summary"), PriorityTier::Development);

    let report = engine.detect_conflicts();
    let resolution = engine.resolve_conflict(
        &ConflictType::CommandName,
        &report.command_conflicts[0].plugins,
        None,
    );
    assert!(!resolution.success);
    assert_eq!(resolution.strategy, ConflictStrategy::Strict);
}

// crates/arbiter-core/src/event/tests/types_tests.rs
#![cfg(test)]

use log::Level;

use crate::event::EngineEvent;

#[test]
fn test_event_names() {
    let events = vec![
        (EngineEvent::ResolutionStarted { plugin_id: "a".into() }, "resolution.started"),
        (
            EngineEvent::ResolutionCompleted { plugin_id: "a".into(), order: vec![], cached: false },
            "resolution.completed",
        ),
        (
            EngineEvent::ResolutionFailed { plugin_id: "a".into(), reason: "x".into() },
            "resolution.failed",
        ),
        (
            EngineEvent::ConflictDetected { kind: "command".into(), name: "run".into(), plugins: vec![] },
            "conflict.detected",
        ),
        (
            EngineEvent::ConflictResolved {
                conflict_type: "command".into(),
                strategy: "strict".into(),
                success: false,
                winner: None,
            },
            "conflict.resolved",
        ),
        (
            EngineEvent::ErrorHandled { plugin_id: None, kind: "load".into(), action: "skip".into() },
            "error.handled",
        ),
        (EngineEvent::PluginDisabled { plugin_id: "a".into() }, "plugin.disabled"),
        (EngineEvent::PluginEnabled { plugin_id: "a".into() }, "plugin.enabled"),
        (EngineEvent::ConfigLoaded { source: "a.toml".into() }, "config.loaded"),
    ];

    for (event, name) in events {
        assert_eq!(event.name(), name);
    }
}

#[test]
fn test_event_severity() {
    assert_eq!(
        EngineEvent::ResolutionFailed { plugin_id: "a".into(), reason: "x".into() }.severity(),
        Level::Error
    );
    assert_eq!(EngineEvent::PluginDisabled { plugin_id: "a".into() }.severity(), Level::Warn);

    let resolved = |success| EngineEvent::ConflictResolved {
        conflict_type: "command".into(),
        strategy: "auto".into(),
        success,
        winner: None,
    };
    assert_eq!(resolved(true).severity(), Level::Info);
    assert_eq!(resolved(false).severity(), Level::Warn);
}

#[test]
fn test_event_display() {
    let completed = EngineEvent::ResolutionCompleted {
        plugin_id: "app".into(),
        order: vec!["core".into(), "app".into()],
        cached: true,
    };
    assert_eq!(completed.to_string(), "Resolved app -> [core, app] (cached)");

    let resolved = EngineEvent::ConflictResolved {
        conflict_type: "command_name".into(),
        strategy: "warn_override".into(),
        success: true,
        winner: Some("core".into()),
    };
    assert_eq!(
        resolved.to_string(),
        "command_name conflict resolved with warn_override, winner core"
    );

    let handled = EngineEvent::ErrorHandled {
        plugin_id: None,
        kind: "other".into(),
        action: "continue".into(),
    };
    assert_eq!(handled.to_string(), "other error in <none> handled with continue");
}

// crates/arbiter-core/src/plugin_system/tests/error_handler_tests.rs
#![cfg(test)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::event::{MemoryReporter, NullReporter};
use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::error_handler::{
    ErrorContext, ErrorHandler, ErrorReport, FailureKind, PluginFailure, RecoveryAction,
    RecoveryStrategy,
};

fn quiet_handler() -> ErrorHandler {
    ErrorHandler::with_reporter(3, Duration::from_secs(1), Arc::new(NullReporter))
}

fn failure(kind: FailureKind) -> PluginFailure {
    PluginFailure::new(kind, "boom")
}

#[test]
fn test_default_recovery_table() {
    assert_eq!(FailureKind::Load.default_recovery(), RecoveryStrategy::Fallback);
    assert_eq!(FailureKind::MissingSymbol.default_recovery(), RecoveryStrategy::Disable);
    assert_eq!(FailureKind::MissingMethod.default_recovery(), RecoveryStrategy::Disable);
    assert_eq!(FailureKind::InvalidArgument.default_recovery(), RecoveryStrategy::FailFast);
    assert_eq!(FailureKind::CircularDependency.default_recovery(), RecoveryStrategy::FailFast);
    assert_eq!(FailureKind::UnresolvedDependency.default_recovery(), RecoveryStrategy::Disable);
    assert_eq!(FailureKind::VersionConflict.default_recovery(), RecoveryStrategy::Fallback);
    assert_eq!(FailureKind::Other.default_recovery(), RecoveryStrategy::LogContinue);
}

#[test]
fn test_failure_from_dependency_error() {
    let cycle: PluginFailure = DependencyError::CircularDependency {
        cycle: vec!["a".into(), "a".into()],
    }
    .into();
    assert_eq!(cycle.kind, FailureKind::CircularDependency);
    assert_eq!(cycle.message, "Circular dependency detected: a -> a");

    let missing: PluginFailure = DependencyError::PluginNotFound("x".into()).into();
    assert_eq!(missing.kind, FailureKind::InvalidArgument);
    assert_eq!(missing.to_string(), "invalid_argument: Plugin 'x' not found in registry");
}

#[test]
fn test_retry_backoff_then_disable() {
    let mut handler = quiet_handler();
    let context = ErrorContext::for_plugin("flaky").with_recovery(RecoveryStrategy::Retry);

    let mut delays = Vec::new();
    for expected_attempt in 1..=3 {
        match handler.handle_error(failure(FailureKind::Load), &context) {
            Ok(RecoveryAction::Retry { plugin, delay, attempt }) => {
                assert_eq!(plugin, "flaky");
                assert_eq!(attempt, expected_attempt);
                delays.push(delay);
            }
            other => panic!("expected a retry, got {:?}", other),
        }
    }
    assert_eq!(
        delays,
        vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
    );

    assert_eq!(
        handler.handle_error(failure(FailureKind::Load), &context),
        Ok(RecoveryAction::Disable { plugin: "flaky".into() })
    );
    assert!(handler.is_plugin_disabled("flaky"));
}

#[test]
fn test_retry_without_plugin_fails_fast() {
    let mut handler = quiet_handler();
    let context = ErrorContext::new().with_recovery(RecoveryStrategy::Retry);
    assert_eq!(
        handler.handle_error(failure(FailureKind::Other), &context),
        Err(failure(FailureKind::Other))
    );
}

#[test]
fn test_exhausted_retries_force_fail_fast_for_table_strategies() {
    let mut handler = quiet_handler();
    let retry = ErrorContext::for_plugin("p").with_recovery(RecoveryStrategy::Retry);
    for _ in 0..3 {
        handler.handle_error(failure(FailureKind::Load), &retry).unwrap();
    }

    // Table says fallback, but the plugin has used up its retries
    let plain = ErrorContext::for_plugin("p");
    assert_eq!(
        handler.handle_error(failure(FailureKind::Load), &plain),
        Err(failure(FailureKind::Load))
    );

    // An explicit recovery is still honoured
    let log = ErrorContext::for_plugin("p").with_recovery(RecoveryStrategy::LogContinue);
    assert_eq!(
        handler.handle_error(failure(FailureKind::Load), &log),
        Ok(RecoveryAction::Continue)
    );
}

#[test]
fn test_fallback_used_when_registered() {
    let mut handler = quiet_handler();
    handler.register_fallback("fancy_csv", Some("basic_csv"));
    assert_eq!(handler.fallback_for("fancy_csv"), Some("basic_csv"));

    let action = handler
        .handle_error(failure(FailureKind::Load), &ErrorContext::for_plugin("fancy_csv"))
        .unwrap();
    assert_eq!(
        action,
        RecoveryAction::Fallback {
            plugin: "fancy_csv".into(),
            fallback: "basic_csv".into(),
        }
    );
    assert!(!handler.is_plugin_disabled("fancy_csv"));
}

#[test]
fn test_missing_fallback_disables() {
    let mut handler = quiet_handler();
    let action = handler
        .handle_error(failure(FailureKind::VersionConflict), &ErrorContext::for_plugin("lonely"))
        .unwrap();
    assert_eq!(action, RecoveryAction::Disable { plugin: "lonely".into() });
}

#[test]
fn test_unusable_fallbacks_disable() {
    let mut handler = quiet_handler();
    handler.set_known_plugins(["primary", "backup"]);
    handler.register_fallback("primary", Some("ghost"));
    let action = handler
        .handle_error(failure(FailureKind::Load), &ErrorContext::for_plugin("primary"))
        .unwrap();
    assert_eq!(action, RecoveryAction::Disable { plugin: "primary".into() });

    // A disabled fallback is no better than none
    handler.register_fallback("other", Some("primary"));
    let action = handler
        .handle_error(failure(FailureKind::Load), &ErrorContext::for_plugin("other"))
        .unwrap();
    assert_eq!(action, RecoveryAction::Disable { plugin: "other".into() });

    handler.register_fallback("other", None);
    assert!(handler.fallback_for("other").is_none());
}

#[test]
fn test_disabled_plugin_short_circuits() {
    let mut handler = quiet_handler();
    let context = ErrorContext::for_plugin("broken");
    handler.handle_error(failure(FailureKind::MissingSymbol), &context).unwrap();
    assert!(handler.is_plugin_disabled("broken"));

    // Even a fail-fast kind comes back as disable once the plugin is off
    assert_eq!(
        handler.handle_error(failure(FailureKind::InvalidArgument), &context),
        Ok(RecoveryAction::Disable { plugin: "broken".into() })
    );
    assert!(matches!(
        handler.ensure_loadable("broken"),
        Err(PluginSystemError::PluginDisabled(ref p)) if p == "broken"
    ));
    assert!(handler.ensure_loadable("fine").is_ok());
}

#[test]
fn test_disable_without_plugin_skips() {
    let mut handler = quiet_handler();
    assert_eq!(
        handler.handle_error(failure(FailureKind::MissingMethod), &ErrorContext::new()),
        Ok(RecoveryAction::Skip)
    );
}

#[test]
fn test_log_continue_and_fail_fast() {
    let mut handler = quiet_handler();
    assert_eq!(
        handler.handle_error(failure(FailureKind::Other), &ErrorContext::for_plugin("p")),
        Ok(RecoveryAction::Continue)
    );
    assert_eq!(
        handler.handle_error(failure(FailureKind::CircularDependency), &ErrorContext::for_plugin("p")),
        Err(failure(FailureKind::CircularDependency))
    );
}

#[test]
fn test_enable_plugin_resets_state() {
    let reporter = Arc::new(MemoryReporter::new());
    let mut handler = ErrorHandler::with_reporter(1, Duration::from_millis(10), reporter.clone());
    let retry = ErrorContext::for_plugin("p").with_recovery(RecoveryStrategy::Retry);

    handler.handle_error(failure(FailureKind::Load), &retry).unwrap();
    assert_eq!(
        handler.handle_error(failure(FailureKind::Load), &retry),
        Ok(RecoveryAction::Disable { plugin: "p".into() })
    );

    handler.enable_plugin("p");
    assert!(!handler.is_plugin_disabled("p"));
    assert_eq!(handler.error_statistics().recovery_attempts.get("p"), Some(&0));
    assert!(matches!(
        handler.handle_error(failure(FailureKind::Load), &retry),
        Ok(RecoveryAction::Retry { attempt: 1, .. })
    ));

    let names = reporter.event_names();
    assert!(names.contains(&"plugin.disabled"));
    assert!(names.contains(&"plugin.enabled"));
    assert_eq!(names.iter().filter(|n| **n == "error.handled").count(), 3);
}

#[test]
fn test_callbacks_observe_failures_and_errors_are_contained() {
    let mut handler = quiet_handler();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    handler.on_error(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    handler.on_error(|_, _| Err("observer broke".into()));
    handler.on_error(|_, _| panic!("observer panicked"));

    let result = handler.handle_error(failure(FailureKind::Other), &ErrorContext::for_plugin("p"));
    assert_eq!(result, Ok(RecoveryAction::Continue));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_statistics_and_report() {
    let mut handler = quiet_handler();
    handler.handle_error(failure(FailureKind::Other), &ErrorContext::for_plugin("a")).unwrap();
    handler.handle_error(failure(FailureKind::Other), &ErrorContext::for_plugin("a")).unwrap();
    handler.handle_error(failure(FailureKind::MissingSymbol), &ErrorContext::for_plugin("b")).unwrap();
    handler.handle_error(failure(FailureKind::Other), &ErrorContext::new()).unwrap();

    let stats = handler.error_statistics();
    assert_eq!(stats.total_errors, 4);
    assert_eq!(stats.errors_by_plugin.get("a"), Some(&2));
    assert_eq!(stats.errors_by_plugin.get("unknown"), Some(&1));
    assert_eq!(stats.errors_by_kind.get("other"), Some(&3));
    assert_eq!(stats.disabled_plugins, vec!["b"]);
    assert_eq!(handler.error_log().len(), 4);
    assert_eq!(handler.error_log()[0].context.plugin.as_deref(), Some("a"));

    let report = ErrorReport::generate(&handler);
    assert!(report.starts_with("Plugin Error Report\n=================================================="));
    assert!(report.contains("Total Errors: 4"));
    assert!(report.contains("  a: 2 errors"));
    assert!(report.contains("  missing_symbol: 1 occurrences"));
    assert!(report.contains("Disabled Plugins:\n  - b"));
    assert!(report.contains("Recovery Attempts:"));

    handler.clear_errors();
    assert_eq!(handler.error_statistics().total_errors, 0);
    assert!(!handler.is_plugin_disabled("b"));
}

#[test]
fn test_wait_ignores_non_retry_actions() {
    // Returns immediately; a retry would sleep
    ErrorHandler::wait(&RecoveryAction::Continue);
    ErrorHandler::wait(&RecoveryAction::Retry {
        plugin: "p".into(),
        delay: Duration::from_millis(1),
        attempt: 1,
    });
}

#[test]
fn test_recovery_strategy_parsing() {
    assert_eq!("fail_fast".parse::<RecoveryStrategy>().unwrap(), RecoveryStrategy::FailFast);
    assert_eq!(RecoveryStrategy::LogContinue.to_string(), "log_continue");
    assert!("explode".parse::<RecoveryStrategy>().is_err());
}

// crates/arbiter-core/src/plugin_system/tests/namespace_tests.rs
#![cfg(test)]

use crate::plugin_system::namespace::{NamespaceAllocator, RecommendedResolution};
use crate::plugin_system::priority::PriorityTier;

fn group(entries: &[(&str, PriorityTier)]) -> Vec<(String, PriorityTier)> {
    entries.iter().map(|(n, t)| (n.to_string(), *t)).collect()
}

#[test]
fn test_generate_uses_tier_prefix_and_sanitized_name() {
    let mut allocator = NamespaceAllocator::default();
    assert_eq!(allocator.generate("My Plugin", PriorityTier::Official), "of_my_plugin");
    assert_eq!(allocator.generate("Arbiter::Io", PriorityTier::Core), "co_arbiter_io");
    assert_eq!(allocator.generate("x", PriorityTier::Development), "de_x");
    assert_eq!(allocator.generate("x", PriorityTier::ThirdParty), "th_x");
    assert_eq!(allocator.generate("x", PriorityTier::Local), "lo_x");
}

#[test]
fn test_generate_is_deterministic() {
    let mut allocator = NamespaceAllocator::default();
    let first = allocator.generate("stats", PriorityTier::Core);
    let second = allocator.generate("stats", PriorityTier::Core);
    assert_eq!(first, second);
    assert_eq!(
        allocator.namespace_mapping().get("stats").map(String::as_str),
        Some("co_stats")
    );
}

#[test]
fn test_detect_conflicts_respects_threshold() {
    let allocator = NamespaceAllocator::default();
    assert!((allocator.similarity_threshold() - 0.7).abs() < f64::EPSILON);

    let plugins = group(&[
        ("plugin_a", PriorityTier::Local),
        ("plugin_b", PriorityTier::Local),
        ("histogram", PriorityTier::Local),
    ]);
    let conflicts = allocator.detect_conflicts(&plugins);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].plugins, ["plugin_a".to_string(), "plugin_b".to_string()]);
    assert!((conflicts[0].similarity - 0.875).abs() < 1e-9);
    assert_eq!(conflicts[0].recommended, RecommendedResolution::Namespace);
}

#[test]
fn test_detect_conflicts_recommends_priority_override() {
    let allocator = NamespaceAllocator::default();

    // similarity 7/9, above the threshold but below the namespace cut-off
    let mixed = group(&[("plugin_a", PriorityTier::Core), ("plugin_xy", PriorityTier::Local)]);
    let conflicts = allocator.detect_conflicts(&mixed);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].recommended, RecommendedResolution::PriorityOverride);

    let same_tier = group(&[("plugin_a", PriorityTier::Local), ("plugin_xy", PriorityTier::Local)]);
    assert_eq!(
        allocator.detect_conflicts(&same_tier)[0].recommended,
        RecommendedResolution::Namespace
    );
}

#[test]
fn test_stricter_threshold_finds_fewer_conflicts() {
    let strict = NamespaceAllocator::new(0.9);
    let plugins = group(&[("plugin_a", PriorityTier::Local), ("plugin_b", PriorityTier::Local)]);
    assert!(strict.detect_conflicts(&plugins).is_empty());
}

#[test]
fn test_resolve_ranks_by_tier() {
    let mut allocator = NamespaceAllocator::default();
    let plugins = group(&[
        ("alpha", PriorityTier::Local),
        ("alpha2", PriorityTier::Core),
        ("alpha3", PriorityTier::Local),
    ]);
    let resolution = allocator.resolve(&plugins);

    let names: Vec<&str> = resolution.plugins.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["alpha2", "alpha", "alpha3"]);
    assert_eq!(resolution.namespace_of("alpha2"), Some("co_alpha2"));
    assert_eq!(resolution.namespace_of("alpha"), Some("lo_alpha_2"));
    assert_eq!(resolution.namespace_of("alpha3"), Some("lo_alpha3_3"));
    assert_eq!(resolution.plugins[2].priority_rank, 3);
    assert_eq!(resolution.message, "Created namespaces for 3 conflicting plugins");

    let mapping = allocator.namespace_mapping();
    assert_eq!(mapping.get("alpha").map(String::as_str), Some("lo_alpha_2"));
}

#[test]
fn test_clear_cache_drops_mappings() {
    let mut allocator = NamespaceAllocator::default();
    allocator.generate("a", PriorityTier::Local);
    allocator.clear_cache();
    assert!(allocator.namespace_mapping().is_empty());
}

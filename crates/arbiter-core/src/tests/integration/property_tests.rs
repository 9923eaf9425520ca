#![cfg(test)]

use std::cmp::Ordering;
use std::collections::HashSet;

use rand::Rng;

use crate::plugin_system::conflict::{ConflictResolver, StrategyOverrides};
use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::manifest::PluginManifest;
use crate::plugin_system::priority::PriorityRegistry;
use crate::plugin_system::resolver::{DependencyResolver, ResolveOptions};
use crate::plugin_system::version::VersionComparator;
use crate::utils::name_similarity;

use super::common::{random_dag, registry, seeded_rng};

const UNCHECKED: ResolveOptions = ResolveOptions {
    check_versions: false,
    skip_optional: false,
};

fn assert_valid_order(manifests: &[PluginManifest], order: &[String]) {
    let unique: HashSet<&String> = order.iter().collect();
    assert_eq!(unique.len(), order.len(), "duplicate entries in {:?}", order);

    let position = |name: &str| order.iter().position(|p| p == name);
    for plugin in order {
        let manifest = manifests.iter().find(|m| &m.name == plugin).unwrap();
        let at = position(plugin).unwrap();
        for dep in manifest.dependency_names() {
            let dep_at = position(dep).unwrap_or_else(|| panic!("{} missing from {:?}", dep, order));
            assert!(dep_at < at, "{} must precede {} in {:?}", dep, plugin, order);
        }
    }
}

#[test]
fn test_random_dags_resolve_dependencies_first() {
    for seed in 0..25 {
        let mut rng = seeded_rng(seed);
        let manifests = random_dag(&mut rng, 15, 3);
        let registry = registry(manifests.clone());
        let mut resolver = DependencyResolver::new();

        for manifest in &manifests {
            let order = resolver.resolve(&registry, &manifest.name, UNCHECKED).unwrap();
            assert_eq!(order.last(), Some(&manifest.name));
            assert_valid_order(&manifests, &order);
        }
    }
}

#[test]
fn test_random_dags_merge_multiple_roots() {
    for seed in 100..120 {
        let mut rng = seeded_rng(seed);
        let manifests = random_dag(&mut rng, 12, 2);
        let registry = registry(manifests.clone());
        let roots: Vec<String> = manifests
            .iter()
            .filter(|_| rng.gen_bool(0.3))
            .map(|m| m.name.clone())
            .collect();

        let mut resolver = DependencyResolver::new();
        let order = resolver.resolve_multiple(&registry, &roots, UNCHECKED).unwrap();
        for root in &roots {
            assert!(order.contains(root));
        }
        assert_valid_order(&manifests, &order);
    }
}

#[test]
fn test_random_cycles_are_detected() {
    for seed in 200..220 {
        let mut rng = seeded_rng(seed);
        let length = rng.gen_range(1..6);
        let names: Vec<String> = (0..length).map(|i| format!("c{}", i)).collect();

        let mut manifests: Vec<PluginManifest> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut manifest = PluginManifest::new(name, "1.0");
                manifest.add_dependency(&names[(i + 1) % length], None);
                manifest
            })
            .collect();
        // Acyclic clutter hanging off the ring
        let mut extra = PluginManifest::new("leaf", "1.0");
        extra.add_dependency(&names[0], None);
        manifests.push(extra);

        let registry = registry(manifests);
        let mut resolver = DependencyResolver::new();
        match resolver.resolve(&registry, "leaf", UNCHECKED) {
            Err(DependencyError::CircularDependency { cycle }) => {
                assert_eq!(cycle.len(), length + 1);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected a cycle for seed {}, got {:?}", seed, other),
        }
    }
}

#[test]
fn test_version_comparison_is_antisymmetric() {
    let mut rng = seeded_rng(7);
    let random_version = |rng: &mut rand::rngs::StdRng| {
        let parts = rng.gen_range(1..=4);
        (0..parts)
            .map(|_| rng.gen_range(0..5).to_string())
            .collect::<Vec<_>>()
            .join(".")
    };

    for _ in 0..200 {
        let a = random_version(&mut rng);
        let b = random_version(&mut rng);
        let forward = VersionComparator::compare(&a, &b).unwrap();
        let backward = VersionComparator::compare(&b, &a).unwrap();
        assert_eq!(forward, backward.reverse(), "{} vs {}", a, b);

        let expected_ge = forward != Ordering::Less;
        let requirement = format!(">= {}", b);
        assert_eq!(
            VersionComparator::satisfies(&a, Some(&requirement)).unwrap(),
            expected_ge,
            "{} {}",
            a,
            requirement
        );
    }
}

#[test]
fn test_namespace_conflicts_follow_similarity_threshold() {
    let names = [
        "json_tools", "csv_tools", "json_tool", "plotter", "plotting", "stats", "statsx", "io",
    ];
    let registry = registry(names.iter().map(|n| PluginManifest::new(n, "1.0")).collect());
    let mut resolver = ConflictResolver::new(PriorityRegistry::new());
    let threshold = resolver.namespaces().similarity_threshold();

    let report = resolver.detect_conflicts(&registry);
    let mut expected = 0;
    for (i, a) in names.iter().enumerate() {
        for b in names.iter().skip(i + 1) {
            let flagged = report
                .namespace_conflicts
                .iter()
                .any(|c| c.involves(a) && c.involves(b));
            assert_eq!(flagged, name_similarity(a, b) > threshold, "{} / {}", a, b);
            if flagged {
                expected += 1;
            }
        }
    }
    assert_eq!(report.namespace_conflicts.len(), expected);
}

#[test]
fn test_resolve_all_covers_every_detected_conflict() {
    let commands = ["load", "save", "plot", "fit"];
    for seed in 300..315 {
        let mut rng = seeded_rng(seed);
        let manifests: Vec<PluginManifest> = (0..6)
            .map(|i| {
                let mut manifest = PluginManifest::new(&format!("plugin_{}", i), "1.0");
                for command in commands {
                    if rng.gen_bool(0.4) {
                        manifest.add_command(command, "run");
                    }
                    if rng.gen_bool(0.2) {
                        manifest.add_method(command);
                    }
                }
                manifest
            })
            .collect();

        let registry = registry(manifests);
        let mut resolver = ConflictResolver::new(PriorityRegistry::new());
        let report = resolver.detect_conflicts(&registry);
        let results = resolver.resolve_all_conflicts(&report, &StrategyOverrides::default());

        assert_eq!(results.len(), report.len());
        assert!(resolver.conflict_log().iter().all(|entry| entry.resolved));
    }
}

#![cfg(test)]

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;
use crate::event::MemoryReporter;
use crate::kernel::engine::Engine;
use crate::plugin_system::manifest::PluginManifest;
use crate::plugin_system::registry::PluginRegistry;

// ===== FIXTURES =====

/// Manifest with required dependencies and no version constraints
pub fn manifest(name: &str, version: &str, deps: &[&str]) -> PluginManifest {
    let mut manifest = PluginManifest::new(name, version);
    for dep in deps {
        manifest.add_dependency(dep, None);
    }
    manifest
}

/// A small statistics ecosystem with official, core, trusted and local plugins.
///
/// `summary` and `Arbiter::Summary` both claim the `describe` command and the
/// `mean` method.
pub fn ecosystem() -> Vec<PluginManifest> {
    let mut io = PluginManifest::new("Arbiter::Io", "2.1.0");
    io.add_command("read", "read_file");

    let mut stats = PluginManifest::new("Arbiter::Summary", "1.4.2");
    stats
        .set_author("Arbiter Team")
        .add_dependency("Arbiter::Io", Some("~> 2.0"))
        .add_command("describe", "summarize")
        .add_method("mean")
        .add_method("median");

    let mut regression = PluginManifest::new("regression", "0.9.0");
    regression
        .set_author("stats-rs")
        .add_dependency("Arbiter::Summary", Some(">= 1.2"))
        .add_optional_dependency("plotting", None)
        .add_method("fit");

    let mut plotting = PluginManifest::new("plotting", "3.0");
    plotting.set_author("science-rs").add_dependency("Arbiter::Io", None);

    let mut summary = PluginManifest::new("summary", "0.1.0");
    summary
        .add_dependency("Arbiter::Io", None)
        .add_command("describe", "my_describe")
        .add_method("mean");

    vec![io, stats, regression, plotting, summary]
}

pub fn registry(manifests: Vec<PluginManifest>) -> PluginRegistry {
    PluginRegistry::from_manifests(manifests).unwrap()
}

/// Engine over `manifests` recording events in the returned reporter
pub fn setup_engine(
    manifests: Vec<PluginManifest>,
    config: EngineConfig,
) -> (Engine, Arc<MemoryReporter>) {
    let reporter = Arc::new(MemoryReporter::new());
    let engine = Engine::with_reporter(registry(manifests), config, reporter.clone()).unwrap();
    (engine, reporter)
}

/// Seeded generator so failures can be reproduced
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Random acyclic registry: plugin `p{i}` only depends on plugins `p{j}`, `j < i`.
pub fn random_dag(rng: &mut StdRng, size: usize, max_deps: usize) -> Vec<PluginManifest> {
    (0..size)
        .map(|i| {
            let mut manifest = PluginManifest::new(&format!("p{}", i), "1.0.0");
            if i > 0 {
                let count = rng.gen_range(0..=max_deps.min(i));
                for _ in 0..count {
                    let dep = format!("p{}", rng.gen_range(0..i));
                    if !manifest.dependency_names().any(|d| d == dep) {
                        manifest.add_dependency(&dep, None);
                    }
                }
            }
            manifest
        })
        .collect()
}

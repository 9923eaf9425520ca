use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::plugin_system::dependency::DependencyError;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::registry::PluginRegistry;
use crate::plugin_system::resolver::{DependencyResolver, StandardOptions};
use crate::plugin_system::version::{VersionComparator, VersionError};

/// A policy for resolving load orders and picking among candidate versions.
pub trait ResolutionStrategy {
    fn kind(&self) -> StrategyKind;

    /// Produce a load order for `name`
    fn resolve(
        &self,
        resolver: &mut DependencyResolver,
        registry: &PluginRegistry,
        name: &str,
    ) -> Result<Vec<String>, DependencyError>;

    /// Pick one of `candidates` satisfying `requirement`, `None` if none does
    fn select_version(
        &self,
        candidates: &[String],
        requirement: Option<&str>,
    ) -> Result<Option<String>, VersionError>;
}

/// Candidates satisfying `requirement`, in input order
fn satisfying<'a>(
    candidates: &'a [String],
    requirement: Option<&str>,
) -> Result<Vec<&'a String>, VersionError> {
    let mut matches = Vec::new();
    for candidate in candidates {
        if VersionComparator::satisfies(candidate, requirement)? {
            matches.push(candidate);
        }
    }
    Ok(matches)
}

/// Extreme of `versions` by numeric order; the first wins on ties
fn pick<'a>(versions: Vec<&'a String>, wanted: Ordering) -> Result<Option<String>, VersionError> {
    let mut best: Option<&'a String> = None;
    for version in versions {
        best = match best {
            Some(current) if VersionComparator::compare(version, current)? != wanted => Some(current),
            _ => Some(version),
        };
    }
    Ok(best.cloned())
}

/// Plain resolution, oldest satisfying version
#[derive(Debug, Default, Clone, Copy)]
pub struct ConservativeStrategy;

impl ResolutionStrategy for ConservativeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Conservative
    }

    fn resolve(
        &self,
        resolver: &mut DependencyResolver,
        registry: &PluginRegistry,
        name: &str,
    ) -> Result<Vec<String>, DependencyError> {
        resolver.standard_resolve(registry, name, StandardOptions::default())
    }

    fn select_version(
        &self,
        candidates: &[String],
        requirement: Option<&str>,
    ) -> Result<Option<String>, VersionError> {
        pick(satisfying(candidates, requirement)?, Ordering::Less)
    }
}

/// Prefers newer versions
#[derive(Debug, Default, Clone, Copy)]
pub struct AggressiveStrategy;

impl ResolutionStrategy for AggressiveStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Aggressive
    }

    fn resolve(
        &self,
        resolver: &mut DependencyResolver,
        registry: &PluginRegistry,
        name: &str,
    ) -> Result<Vec<String>, DependencyError> {
        let options = StandardOptions {
            prefer_newer: true,
            ..StandardOptions::default()
        };
        resolver.standard_resolve(registry, name, options)
    }

    fn select_version(
        &self,
        candidates: &[String],
        requirement: Option<&str>,
    ) -> Result<Option<String>, VersionError> {
        pick(satisfying(candidates, requirement)?, Ordering::Greater)
    }
}

/// Loads only required dependencies
#[derive(Debug, Default, Clone, Copy)]
pub struct MinimalStrategy;

impl ResolutionStrategy for MinimalStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Minimal
    }

    fn resolve(
        &self,
        resolver: &mut DependencyResolver,
        registry: &PluginRegistry,
        name: &str,
    ) -> Result<Vec<String>, DependencyError> {
        let options = StandardOptions {
            skip_optional: true,
            ..StandardOptions::default()
        };
        resolver.standard_resolve(registry, name, options)
    }

    fn select_version(
        &self,
        candidates: &[String],
        requirement: Option<&str>,
    ) -> Result<Option<String>, VersionError> {
        if let Some(required) = requirement {
            if let Some(exact) = candidates.iter().find(|c| c.as_str() == required) {
                return Ok(Some(exact.clone()));
            }
        }
        ConservativeStrategy.select_version(candidates, requirement)
    }
}

/// Named resolution strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Conservative,
    Aggressive,
    Minimal,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Conservative => "conservative",
            StrategyKind::Aggressive => "aggressive",
            StrategyKind::Minimal => "minimal",
        }
    }

    pub fn strategy(&self) -> Box<dyn ResolutionStrategy> {
        match self {
            StrategyKind::Conservative => Box::new(ConservativeStrategy),
            StrategyKind::Aggressive => Box::new(AggressiveStrategy),
            StrategyKind::Minimal => Box::new(MinimalStrategy),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = PluginSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "conservative" => Ok(StrategyKind::Conservative),
            "aggressive" => Ok(StrategyKind::Aggressive),
            "minimal" => Ok(StrategyKind::Minimal),
            other => Err(PluginSystemError::InvalidStrategy(format!(
                "Unknown resolution strategy: {}",
                other
            ))),
        }
    }
}

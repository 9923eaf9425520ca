use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::kernel::constants::DEFAULT_PLUGIN_VERSION;
use crate::plugin_system::dependency::PluginDependency;
use crate::plugin_system::version::VersionConstraint;

/// The fixed category a plugin registers into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionPoint {
    #[default]
    StatisticsModule,
    CliCommand,
    FileFormat,
    OutputFormat,
    Validator,
}

impl ExtensionPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionPoint::StatisticsModule => "statistics_module",
            ExtensionPoint::CliCommand => "cli_command",
            ExtensionPoint::FileFormat => "file_format",
            ExtensionPoint::OutputFormat => "output_format",
            ExtensionPoint::Validator => "validator",
        }
    }
}

impl fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes a registered plugin.
///
/// Supplied by the plugin at registration time; the engine only reads it.
/// Handler methods are declared in `methods` rather than discovered, and the
/// priority tier lives in the [`PriorityRegistry`](crate::plugin_system::priority::PriorityRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Unique identifier for the plugin
    pub name: String,

    /// Plugin version, dotted numeric
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub author: String,

    /// Source repository (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Plugin dependencies
    #[serde(default, deserialize_with = "deserialize_dependencies")]
    pub dependencies: Vec<PluginDependency>,

    /// CLI command name -> handler symbol
    #[serde(default)]
    pub commands: BTreeMap<String, String>,

    /// Public handler methods exposed by the plugin
    #[serde(default)]
    pub methods: Vec<String>,

    #[serde(default)]
    pub extension_point: ExtensionPoint,

    /// Development/debug build markers
    #[serde(default)]
    pub development: bool,
    #[serde(default)]
    pub debug: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Explicit "official plugin" marker
    #[serde(default)]
    pub official: bool,

    /// Tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_version() -> String {
    DEFAULT_PLUGIN_VERSION.to_string()
}

/// Accepted spellings for a manifest's `dependencies` field.
#[derive(Deserialize)]
#[serde(untagged)]
enum DependencySpec {
    /// `["core", "io"]`
    Names(Vec<String>),
    /// `[{ name = "core", version = "~> 1.2", required = false }]`
    Detailed(Vec<PluginDependency>),
    /// `{ core = "~> 1.2", io = "*" }`
    Constraints(BTreeMap<String, Option<String>>),
}

fn deserialize_dependencies<'de, D>(deserializer: D) -> Result<Vec<PluginDependency>, D::Error>
where
    D: Deserializer<'de>,
{
    let spec = DependencySpec::deserialize(deserializer)?;
    Ok(match spec {
        DependencySpec::Names(names) => names
            .iter()
            .map(|name| PluginDependency::required_any(name))
            .collect(),
        DependencySpec::Detailed(deps) => deps,
        DependencySpec::Constraints(map) => map
            .into_iter()
            .map(|(name, constraint)| match constraint {
                Some(c) => PluginDependency::required(&name, c),
                None => PluginDependency::required_any(&name),
            })
            .collect(),
    })
}

impl PluginManifest {
    /// Create a new plugin manifest
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            description: String::new(),
            author: String::new(),
            repository: None,
            dependencies: Vec::new(),
            commands: BTreeMap::new(),
            methods: Vec::new(),
            extension_point: ExtensionPoint::default(),
            development: false,
            debug: false,
            environment: None,
            official: false,
            tags: Vec::new(),
        }
    }

    /// Add a required dependency, `None` meaning any version
    pub fn add_dependency(&mut self, name: &str, constraint: Option<&str>) -> &mut Self {
        let dependency = match constraint {
            Some(c) => PluginDependency::required(name, c),
            None => PluginDependency::required_any(name),
        };
        self.dependencies.push(dependency);
        self
    }

    /// Add an optional dependency
    pub fn add_optional_dependency(&mut self, name: &str, constraint: Option<&str>) -> &mut Self {
        let dependency = match constraint {
            Some(c) => PluginDependency::optional(name, c),
            None => PluginDependency::optional_any(name),
        };
        self.dependencies.push(dependency);
        self
    }

    /// Register a CLI command handled by `handler`
    pub fn add_command(&mut self, command: &str, handler: &str) -> &mut Self {
        self.commands.insert(command.to_string(), handler.to_string());
        self
    }

    /// Declare a public handler method
    pub fn add_method(&mut self, method: &str) -> &mut Self {
        self.methods.push(method.to_string());
        self
    }

    pub fn set_author(&mut self, author: &str) -> &mut Self {
        self.author = author.to_string();
        self
    }

    pub fn set_repository(&mut self, repository: &str) -> &mut Self {
        self.repository = Some(repository.to_string());
        self
    }

    pub fn set_description(&mut self, description: &str) -> &mut Self {
        self.description = description.to_string();
        self
    }

    pub fn set_extension_point(&mut self, extension_point: ExtensionPoint) -> &mut Self {
        self.extension_point = extension_point;
        self
    }

    pub fn set_development(&mut self, development: bool) -> &mut Self {
        self.development = development;
        self
    }

    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    pub fn set_environment(&mut self, environment: &str) -> &mut Self {
        self.environment = Some(environment.to_string());
        self
    }

    pub fn set_official(&mut self, official: bool) -> &mut Self {
        self.official = official;
        self
    }

    /// Add a tag to the plugin
    pub fn add_tag(&mut self, tag: &str) -> &mut Self {
        self.tags.push(tag.to_string());
        self
    }

    /// Names of all direct dependencies, in declaration order
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.plugin_name.as_str())
    }

    /// Constraint declared on the dependency named `name`
    pub fn constraint_for(&self, name: &str) -> Option<&VersionConstraint> {
        self.dependencies
            .iter()
            .find(|d| d.plugin_name == name)
            .and_then(|d| d.version_range.as_ref())
    }
}

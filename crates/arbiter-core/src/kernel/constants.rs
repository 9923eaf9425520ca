/// Engine name
pub const ENGINE_NAME: &str = "Arbiter";

/// Engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version assumed for plugins that declare none
pub const DEFAULT_PLUGIN_VERSION: &str = "0.0.0";

/// Default number of retries before a plugin is disabled
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential retry backoff, in milliseconds
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Names more similar than this are reported as namespace conflicts
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Above this similarity two plugins are namespaced rather than overridden
pub const NAMESPACE_RECOMMENDATION_THRESHOLD: f64 = 0.8;

/// Methods with this prefix are lifecycle hooks and never conflict
pub const PLUGIN_METHOD_PREFIX: &str = "plugin_";

/// Name prefix identifying core plugins
pub const CORE_PLUGIN_PREFIX: &str = "Arbiter::";

/// Marker in a manifest name identifying core plugins
pub const CORE_NAME_MARKER: &str = "Core";

/// Author substring identifying the official team
pub const OFFICIAL_AUTHOR_MARKER: &str = "Arbiter Team";

/// Repository substring identifying official plugins
pub const OFFICIAL_REPOSITORY_MARKER: &str = "arbiter/plugins";

/// Environment value that marks a development plugin
pub const DEVELOPMENT_ENVIRONMENT: &str = "development";

/// Authors whose plugins are trusted third-party by default
pub const TRUSTED_AUTHORS: &[&str] = &["stats-rs", "data-analysis-tools", "science-rs", "ml-rs"];

/// Placeholder used in statistics when an error has no plugin
pub const UNKNOWN_PLUGIN: &str = "unknown";

//! Host configuration
//!
//! Loads [`HostConfig`] from layered sources, lowest precedence first:
//!
//! - built-in defaults
//! - an optional configuration file (TOML, YAML or JSON, detected from the
//!   file extension)
//! - `PARSEKIT__*` environment variables (`__` separates nested keys, e.g.
//!   `PARSEKIT__LIMITS__MAX_OPERATIONS`)

use config::{Config, Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PARSEKIT";

/// File names probed in the working directory when no path is given
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "parsekit.toml",
    "parsekit.yaml",
    "parsekit.yml",
    "parsekit.json",
];

/// Unit basenames the reinit scan treats as plugin entry units
pub const ENTRY_UNITS: &[&str] = &["parser", "core"];

/// Configuration errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Config parsing error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid plugin namespace: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Execution limits applied to the script engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptLimits {
    /// Maximum number of operations per execution
    pub max_operations: u64,
    /// Maximum function call depth
    pub max_call_levels: usize,
    /// Maximum string length
    pub max_string_size: usize,
    /// Maximum array length
    pub max_array_size: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: 1_000_000,
            max_call_levels: 64,
            max_string_size: 1_000_000,
            max_array_size: 100_000,
        }
    }
}

/// Plugin host configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory that dotted unit names are resolved against
    pub source_root: PathBuf,
    /// Top-level namespace of the framework units
    pub namespace: String,
    /// Namespace segment under which plugin packages live
    pub plugin_segment: String,
    /// Script file extension (without the dot)
    pub script_extension: String,
    /// File stem that makes a directory a package
    pub package_entry: String,
    /// Script engine limits
    pub limits: ScriptLimits,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            namespace: "parsers".to_string(),
            plugin_segment: "user_parsers".to_string(),
            script_extension: "rhai".to_string(),
            package_entry: "mod".to_string(),
            limits: ScriptLimits::default(),
        }
    }
}

impl HostConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source root
    pub fn with_source_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.source_root = root.as_ref().to_path_buf();
        self
    }

    /// Set the framework namespace
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// Set the plugin namespace segment
    pub fn with_plugin_segment(mut self, segment: &str) -> Self {
        self.plugin_segment = segment.to_string();
        self
    }

    /// Set the script engine limits
    pub fn with_limits(mut self, limits: ScriptLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Dotted name of the plugin namespace root, e.g. `parsers.user_parsers`
    pub fn plugin_root(&self) -> String {
        format!("{}.{}", self.namespace, self.plugin_segment)
    }

    /// Prefix selecting the units a full reload covers
    pub fn reload_prefix(&self) -> String {
        format!("{}.", self.namespace)
    }

    /// Build the name matcher for this configuration's plugin namespace
    pub fn plugin_namespace(&self) -> ConfigResult<PluginNamespace> {
        PluginNamespace::new(&self.namespace, &self.plugin_segment)
    }

    /// Load configuration from defaults, an optional file and the environment
    ///
    /// Without an explicit path the first existing entry of
    /// [`DEFAULT_CONFIG_FILES`] in the working directory is used, if any.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                let format = detect_format(path)?;
                builder = builder.add_source(File::from(path).format(format).required(true));
            }
            None => {
                let found = DEFAULT_CONFIG_FILES
                    .iter()
                    .map(Path::new)
                    .find(|candidate| candidate.exists());
                if let Some(path) = found {
                    let format = detect_format(path)?;
                    builder = builder.add_source(File::from(path).format(format).required(false));
                }
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// Detect configuration format from file extension
pub fn detect_format(path: &Path) -> ConfigResult<FileFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat(format!("{}", path.display())))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Name rules of the plugin namespace
///
/// A unit is a plugin unit when the plugin segment appears in its dotted name
/// before the last segment. The namespace root (`<namespace>.<segment>`) is
/// neither a base unit nor a plugin unit.
#[derive(Debug, Clone)]
pub struct PluginNamespace {
    namespace: String,
    segment: String,
    root: String,
    entry: Regex,
}

impl PluginNamespace {
    /// Create the matcher for `namespace` and `segment`
    pub fn new(namespace: &str, segment: &str) -> ConfigResult<Self> {
        let entry = Regex::new(&format!(
            r"^.*\.{}\..*\.({})$",
            regex::escape(segment),
            ENTRY_UNITS.join("|")
        ))?;

        Ok(Self {
            namespace: namespace.to_string(),
            segment: segment.to_string(),
            root: format!("{namespace}.{segment}"),
            entry,
        })
    }

    /// Framework namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Plugin segment
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Dotted name of the plugin namespace root
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Whether `name` is the plugin namespace root itself
    pub fn is_root(&self, name: &str) -> bool {
        name == self.root
    }

    /// Whether `name` is nested under a plugin segment
    pub fn is_plugin_unit(&self, name: &str) -> bool {
        let mut segments: Vec<&str> = name.split('.').collect();
        segments.pop();
        segments.iter().any(|s| *s == self.segment)
    }

    /// Whether `name` belongs to the framework namespace proper
    pub fn is_base_unit(&self, name: &str) -> bool {
        let in_namespace = name == self.namespace
            || name
                .strip_prefix(self.namespace.as_str())
                .is_some_and(|rest| rest.starts_with('.'));

        in_namespace && !self.is_root(name) && !self.is_plugin_unit(name)
    }

    /// Whether `name` is a plugin entry unit (`*.<segment>.*.(parser|core)`)
    pub fn is_entry_unit(&self, name: &str) -> bool {
        self.entry.is_match(name)
    }

    /// Pattern matching plugin units whose name ends with `basename`
    pub fn member_pattern(&self, basename: &str) -> Result<Regex, regex::Error> {
        Regex::new(&format!(
            r"^.*\.{}\..*{}$",
            regex::escape(&self.segment),
            regex::escape(basename)
        ))
    }
}

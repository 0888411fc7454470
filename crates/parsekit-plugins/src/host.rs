//! Plugin host
//!
//! [`UnitHost`] owns the unit registry together with the script loader. It is
//! created once per process, mutated only by load and reload operations, and
//! dropped at exit.
//!
//! ```no_run
//! use parsekit_plugins::config::HostConfig;
//! use parsekit_plugins::host::UnitHost;
//! use parsekit_plugins::hot_reload::TracingProgress;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut host = UnitHost::new(HostConfig::new().with_source_root("/srv/scrapers"))?;
//!
//! let argv: Vec<String> = std::env::args().collect();
//! let name = host.select_parser(&argv)?.name.clone();
//! let result = host.run_entry(&name, "main")?;
//! println!("{result}");
//!
//! let prefix = host.config().reload_prefix();
//! host.reload_all(&prefix, &mut TracingProgress)?;
//! # Ok(())
//! # }
//! ```

use crate::config::{ConfigResult, HostConfig, PluginNamespace};
use crate::error::ParserError;
use crate::hot_reload::{
    INFO_KEY, LoadError, ReloadError, ReloadProgress, ScriptLoader, Unit, UnitRegistry, check_reinit_state,
    find_package, reload_order,
};
use crate::resolver::{self, ResolveError};
use rhai::Dynamic;
use tracing::{debug, info};

/// Host operation errors
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Domain error raised by a unit
    #[error(transparent)]
    Parser(ParserError),

    #[error(transparent)]
    Load(LoadError),

    #[error("Unit not loaded: {0}")]
    UnitNotLoaded(String),
}

impl From<LoadError> for HostError {
    fn from(err: LoadError) -> Self {
        match err.parser_error() {
            Some(parser_error) => Self::Parser(parser_error),
            None => Self::Load(err),
        }
    }
}

/// Owner of the loaded units
pub struct UnitHost {
    loader: ScriptLoader,
    registry: UnitRegistry,
}

impl UnitHost {
    /// Create a host with an empty registry
    pub fn new(config: HostConfig) -> ConfigResult<Self> {
        Ok(Self {
            loader: ScriptLoader::new(config)?,
            registry: UnitRegistry::new(),
        })
    }

    /// Host configuration
    pub fn config(&self) -> &HostConfig {
        self.loader.config()
    }

    /// Loaded units
    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// Plugin namespace rules
    pub fn namespace(&self) -> &PluginNamespace {
        self.loader.namespace()
    }

    /// Load unit `name`, returning the registered unit if already loaded
    pub fn import(&mut self, name: &str) -> Result<&Unit, LoadError> {
        self.loader.load(&mut self.registry, name)
    }

    /// Load the parser unit of the plugin named by `argv[1]`
    pub fn select_parser(&mut self, argv: &[String]) -> Result<&Unit, ResolveError> {
        let name = match resolver::plugin_name(argv) {
            Ok(name) => name,
            Err(err) => {
                debug!("{}", err);
                return Err(err);
            }
        };

        let unit_name = resolver::parser_unit_name(&self.loader.config().plugin_root(), name);
        self.loader
            .load(&mut self.registry, &unit_name)
            .map_err(|err| {
                if err.is_not_found() {
                    debug!("Non-existent parser name passed: {}", name);
                    ResolveError::UnknownPlugin {
                        name: name.to_string(),
                        source: err,
                    }
                } else {
                    debug!("Failed to load parser {}: {}", name, err);
                    ResolveError::Load(err)
                }
            })
    }

    /// Load the parser unit of `package` under `alternative_root`, or under
    /// the plugin namespace root when none is given
    pub fn import_core(&mut self, package: &str, alternative_root: Option<&str>) -> Result<&Unit, LoadError> {
        let root = match alternative_root {
            Some(root) => root.to_string(),
            None => self.loader.config().plugin_root(),
        };
        let unit_name = resolver::parser_unit_name(&root, package);
        self.loader.load(&mut self.registry, &unit_name)
    }

    /// Whether the newest plugin entry unit asks for a session reset
    pub fn check_reinit_state(&self) -> bool {
        check_reinit_state(&self.registry, self.loader.namespace())
    }

    /// Re-execute every loaded unit under `prefix`
    ///
    /// Stops at the first failing unit. Units reloaded before it keep their
    /// new state.
    pub fn reload_all(&mut self, prefix: &str, progress: &mut dyn ReloadProgress) -> Result<usize, ReloadError> {
        let order = reload_order(&self.registry, prefix, self.loader.namespace());

        let mut count = 0;
        for name in &order {
            progress.reloading(name);
            self.reload_unit(name)?;
            progress.reloaded(name);
            count += 1;
        }

        progress.finished(count);
        info!("Reloaded {} units under '{}'", count, prefix);
        Ok(count)
    }

    /// Re-execute the plugin package `identifier` refers to
    ///
    /// Returns the name of the reloaded package.
    pub fn reload_package(
        &mut self,
        identifier: &str,
        progress: &mut dyn ReloadProgress,
    ) -> Result<String, ReloadError> {
        let package = find_package(&self.registry, self.loader.namespace(), identifier)?;

        progress.reloading(&package);
        self.reload_unit(&package)?;
        progress.reloaded(&package);

        Ok(package)
    }

    /// Re-execute a single loaded unit
    pub fn reload_unit(&mut self, name: &str) -> Result<(), ReloadError> {
        let unit = self
            .registry
            .get_mut(name)
            .ok_or_else(|| ReloadError::UnitNotLoaded(name.to_string()))?;
        self.loader.reexecute(unit)?;
        Ok(())
    }

    /// Call `function` of the loaded unit `name`
    pub fn run_entry(&self, name: &str, function: &str) -> Result<Dynamic, HostError> {
        let unit = self
            .registry
            .get(name)
            .ok_or_else(|| HostError::UnitNotLoaded(name.to_string()))?;
        Ok(self.loader.call_entry(unit, function)?)
    }

    /// Interactive snippets from the `info` text of unit `name`
    pub fn repl_snippets(&self, name: &str) -> Option<String> {
        let info = self.registry.get(name)?.get_str(INFO_KEY)?;
        Some(repl_snippets(&info))
    }
}

/// Every `>>>` snippet of `info`, up to the end of its line
///
/// Only newline-terminated lines count. Without any snippet the whole text is
/// returned.
pub fn repl_snippets(info: &str) -> String {
    let snippets: String = info
        .split_inclusive('\n')
        .filter(|line| line.ends_with('\n'))
        .filter_map(|line| line.find(">>>").map(|start| &line[start..]))
        .collect();

    if snippets.is_empty() {
        info.to_string()
    } else {
        snippets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_snippets() {
        let info = "Demo parser\n\nUsage:\n    >>> fn()\n    >>> pa.title  # title\nend";
        assert_eq!(repl_snippets(info), ">>> fn()\n>>> pa.title  # title\n");
    }

    #[test]
    fn test_repl_snippets_fall_back_to_info() {
        assert_eq!(repl_snippets("no snippets here"), "no snippets here");
        assert_eq!(repl_snippets(">>> unterminated"), ">>> unterminated");
        assert_eq!(repl_snippets(""), "");
    }

    #[test]
    fn test_host_error_from_load_error() {
        let err = HostError::from(LoadError::ModuleNotFound("x".to_string()));
        assert!(matches!(err, HostError::Load(LoadError::ModuleNotFound(_))));
    }
}

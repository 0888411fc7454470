//! Reload planning
//!
//! Decides which units a reload covers and in which order. Execution itself is
//! driven by [`crate::host::UnitHost`].

use super::loader::LoadError;
use super::registry::UnitRegistry;
use crate::config::PluginNamespace;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Reload error types
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("No module named '{0}'")]
    PackageNotFound(String),

    #[error("Unit not loaded: {0}")]
    UnitNotLoaded(String),

    #[error("Reload failed: {0}")]
    Execution(#[from] LoadError),

    #[error("Invalid package pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Names of the units a full reload under `prefix` covers, in reload order
///
/// Base units come first in load order, followed by plugin units sorted by
/// name length, longest first. Equal lengths keep load order. The plugin
/// namespace root itself is never reloaded.
pub fn reload_order(registry: &UnitRegistry, prefix: &str, namespace: &PluginNamespace) -> Vec<String> {
    let (mut plugins, base): (Vec<&str>, Vec<&str>) = registry
        .iter()
        .map(|unit| unit.name.as_str())
        .filter(|name| name.starts_with(prefix) && !namespace.is_root(name))
        .partition(|name| namespace.is_plugin_unit(name));

    plugins.sort_by_key(|name| Reverse(name.len()));

    base.into_iter()
        .chain(plugins)
        .map(str::to_string)
        .collect()
}

/// Locate the package a partial `identifier` refers to
///
/// The first plugin unit whose name ends with the identifier's basename wins.
/// When that unit is not a package root the search repeats with its owning
/// package, until a package root is reached.
pub fn find_package(
    registry: &UnitRegistry,
    namespace: &PluginNamespace,
    identifier: &str,
) -> Result<String, ReloadError> {
    let not_found = || ReloadError::PackageNotFound(identifier.to_string());

    let mut current = identifier.to_string();
    let mut visited = HashSet::new();

    loop {
        let pattern = namespace.member_pattern(basename(&current))?;
        let unit = registry
            .iter()
            .find(|unit| pattern.is_match(&unit.name))
            .ok_or_else(not_found)?;

        if unit.is_package_root() {
            return Ok(unit.name.clone());
        }
        if !visited.insert(unit.name.clone()) {
            return Err(not_found());
        }
        current = unit.owner_package.clone();
    }
}

/// Whole identifier when it is a bare alphabetic token, else its last segment
fn basename(identifier: &str) -> &str {
    if !identifier.is_empty() && identifier.chars().all(char::is_alphabetic) {
        identifier
    } else {
        identifier.rsplit('.').next().unwrap_or(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hot_reload::registry::{Unit, UnitKind};

    fn namespace() -> PluginNamespace {
        PluginNamespace::new("root", "user_parsers").unwrap()
    }

    fn registry(units: &[(&str, UnitKind)]) -> UnitRegistry {
        let mut registry = UnitRegistry::new();
        for (name, kind) in units {
            registry.register(Unit::new(name, *kind)).unwrap();
        }
        registry
    }

    #[test]
    fn test_reload_order_base_then_longest_plugin() {
        let registry = registry(&[
            ("A", UnitKind::Module),
            ("root.user_parsers.p1.core", UnitKind::Module),
            ("B", UnitKind::Module),
            ("root.user_parsers.p1.sub.core", UnitKind::Module),
        ]);

        let order = reload_order(&registry, "", &namespace());
        assert_eq!(
            order,
            vec![
                "A",
                "B",
                "root.user_parsers.p1.sub.core",
                "root.user_parsers.p1.core",
            ]
        );
    }

    #[test]
    fn test_reload_order_filters_prefix_and_root() {
        let registry = registry(&[
            ("root", UnitKind::Package),
            ("root.constants", UnitKind::Module),
            ("root.user_parsers", UnitKind::NamespacePackage),
            ("root.user_parsers.ab", UnitKind::Package),
            ("root.user_parsers.cd", UnitKind::Package),
            ("root.user_parsers.ab.parser", UnitKind::Module),
            ("other.unit", UnitKind::Module),
        ]);

        let order = reload_order(&registry, "root.", &namespace());
        assert_eq!(
            order,
            vec![
                "root.constants",
                "root.user_parsers.ab.parser",
                "root.user_parsers.ab",
                "root.user_parsers.cd",
            ]
        );
    }

    #[test]
    fn test_reload_order_empty_registry() {
        assert!(reload_order(&UnitRegistry::new(), "root.", &namespace()).is_empty());
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("core"), "core");
        assert_eq!(basename("p1"), "p1");
        assert_eq!(basename("root.user_parsers.p1"), "p1");
        assert_eq!(basename(""), "");
    }

    #[test]
    fn test_find_package_walks_to_package_root() {
        let ns = namespace();

        let package_first = registry(&[
            ("root.user_parsers.p1", UnitKind::Package),
            ("root.user_parsers.p1.core", UnitKind::Module),
        ]);
        let module_first = registry(&[
            ("root.user_parsers.p1.core", UnitKind::Module),
            ("root.user_parsers.p1", UnitKind::Package),
        ]);

        for registry in [&package_first, &module_first] {
            assert_eq!(find_package(registry, &ns, "p1").unwrap(), "root.user_parsers.p1");
            assert_eq!(find_package(registry, &ns, "core").unwrap(), "root.user_parsers.p1");
            assert_eq!(
                find_package(registry, &ns, "root.user_parsers.p1.core").unwrap(),
                "root.user_parsers.p1"
            );
        }
    }

    #[test]
    fn test_find_package_not_found() {
        let registry = registry(&[
            ("root.user_parsers.p1", UnitKind::Package),
            ("root.user_parsers.p1.core", UnitKind::Module),
        ]);

        assert!(matches!(
            find_package(&registry, &namespace(), "nonexistent"),
            Err(ReloadError::PackageNotFound(name)) if name == "nonexistent"
        ));
    }

    #[test]
    fn test_find_package_without_package_root() {
        // Owning package was never loaded as a unit of its own.
        let registry = registry(&[("root.user_parsers.p2.core", UnitKind::Module)]);

        assert!(matches!(
            find_package(&registry, &namespace(), "core"),
            Err(ReloadError::PackageNotFound(_))
        ));
    }
}

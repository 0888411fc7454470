//! Unit registry
//!
//! Tracks every loaded unit in load order

use rhai::{AST, Dynamic};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level variables of an executed unit
pub type BodyState = BTreeMap<String, Dynamic>;

/// Body-state key a unit sets to request a session reset
pub const REINIT_KEY: &str = "reinit";

/// Body-state key holding a unit's usage text
pub const INFO_KEY: &str = "info";

/// How a unit is backed on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// A single script file
    Module,
    /// A directory with a package entry script
    Package,
    /// A directory without an entry script
    NamespacePackage,
}

impl UnitKind {
    /// Whether units of this kind own their submodules
    pub fn is_package(&self) -> bool {
        !matches!(self, UnitKind::Module)
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::Module => write!(f, "module"),
            UnitKind::Package => write!(f, "package"),
            UnitKind::NamespacePackage => write!(f, "namespace"),
        }
    }
}

/// A loaded code unit
#[derive(Debug, Clone)]
pub struct Unit {
    /// Fully-qualified dotted name
    pub name: String,
    /// Nearest enclosing package, or the unit itself for a package
    pub owner_package: String,
    /// Part of the framework namespace rather than a plugin
    pub is_base_unit: bool,
    /// Backing kind
    pub kind: UnitKind,
    /// Script path, absent for namespace packages
    pub path: Option<PathBuf>,
    /// State left behind by the last execution
    pub body_state: BodyState,
    /// Load timestamp
    pub loaded_at: Option<u64>,
    /// Last reload timestamp
    pub last_reload: Option<u64>,
    /// Reload count
    pub reload_count: u32,
    ast: Option<AST>,
}

impl Unit {
    /// Create an unexecuted unit
    pub fn new(name: &str, kind: UnitKind) -> Self {
        Self {
            name: name.to_string(),
            owner_package: owner_package_of(name, kind),
            is_base_unit: false,
            kind,
            path: None,
            body_state: BodyState::new(),
            loaded_at: None,
            last_reload: None,
            reload_count: 0,
            ast: None,
        }
    }

    /// Set base-unit classification
    pub fn with_base_unit(mut self, is_base_unit: bool) -> Self {
        self.is_base_unit = is_base_unit;
        self
    }

    /// Set script path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set body state
    pub fn with_body_state(mut self, body_state: BodyState) -> Self {
        self.body_state = body_state;
        self
    }

    /// Whether this unit is the root of its own package
    pub fn is_package_root(&self) -> bool {
        self.name == self.owner_package
    }

    /// Compiled script of the last execution
    pub fn ast(&self) -> Option<&AST> {
        self.ast.as_ref()
    }

    /// Look up a body-state value
    pub fn get(&self, key: &str) -> Option<&Dynamic> {
        self.body_state.get(key)
    }

    /// Read a body-state flag; absent or non-boolean values are `false`
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(|v| v.as_bool().ok()).unwrap_or(false)
    }

    /// Read a body-state string
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.clone().into_string().ok())
    }

    /// Replace code and state after an execution
    pub(crate) fn replace_state(&mut self, ast: Option<AST>, body_state: BodyState) {
        self.ast = ast;
        self.body_state = body_state;
    }

    /// Mark as loaded
    pub fn mark_loaded(&mut self) {
        self.loaded_at = Some(unix_now());
    }

    /// Mark as reloaded
    pub fn mark_reloaded(&mut self) {
        self.last_reload = Some(unix_now());
        self.reload_count += 1;
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Owning package of a unit named `name`
pub fn owner_package_of(name: &str, kind: UnitKind) -> String {
    if kind.is_package() {
        return name.to_string();
    }
    parent_of(name).unwrap_or_default().to_string()
}

/// Dotted parent of `name`, if any
pub fn parent_of(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(parent, _)| parent)
}

/// Insertion-ordered set of loaded units
///
/// Entries are never reordered or removed; they live as long as the registry.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: Vec<Unit>,
    index: HashMap<String, usize>,
}

impl UnitRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit
    pub fn register(&mut self, unit: Unit) -> Result<&Unit, String> {
        if self.index.contains_key(&unit.name) {
            return Err(format!("Unit {} already registered", unit.name));
        }

        debug!("Registering unit: {} ({})", unit.name, unit.kind);

        let position = self.units.len();
        self.index.insert(unit.name.clone(), position);
        self.units.push(unit);
        Ok(&self.units[position])
    }

    /// Get a unit by name
    pub fn get(&self, name: &str) -> Option<&Unit> {
        self.index.get(name).map(|&i| &self.units[i])
    }

    /// Get a mutable unit by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Unit> {
        match self.index.get(name) {
            Some(&i) => self.units.get_mut(i),
            None => None,
        }
    }

    /// Check if a unit is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of registered units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether nothing is loaded yet
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in load order
    pub fn iter(&self) -> std::slice::Iter<'_, Unit> {
        self.units.iter()
    }

    /// Unit names in load order
    pub fn names(&self) -> Vec<String> {
        self.units.iter().map(|u| u.name.clone()).collect()
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total_units: self.units.len(),
            ..RegistryStats::default()
        };

        for unit in &self.units {
            if unit.kind.is_package() {
                stats.packages += 1;
            }
            if unit.is_base_unit {
                stats.base_units += 1;
            }
            stats.total_reloads += unit.reload_count as usize;
        }

        stats
    }
}

impl<'a> IntoIterator for &'a UnitRegistry {
    type Item = &'a Unit;
    type IntoIter = std::slice::Iter<'a, Unit>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Total registered units
    pub total_units: usize,
    /// Packages, namespace packages included
    pub packages: usize,
    /// Framework units
    pub base_units: usize,
    /// Total reload count
    pub total_reloads: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_package() {
        assert_eq!(owner_package_of("a.b.c", UnitKind::Module), "a.b");
        assert_eq!(owner_package_of("a.b", UnitKind::Package), "a.b");
        assert_eq!(owner_package_of("a", UnitKind::NamespacePackage), "a");
        assert_eq!(owner_package_of("top", UnitKind::Module), "");
    }

    #[test]
    fn test_unit_flags() {
        let mut state = BodyState::new();
        state.insert(REINIT_KEY.to_string(), Dynamic::from(true));
        state.insert("count".to_string(), Dynamic::from(3_i64));
        state.insert(INFO_KEY.to_string(), Dynamic::from("usage".to_string()));

        let unit = Unit::new("p.user_parsers.x.parser", UnitKind::Module).with_body_state(state);
        assert!(unit.flag(REINIT_KEY));
        assert!(!unit.flag("count"));
        assert!(!unit.flag("missing"));
        assert_eq!(unit.get_str(INFO_KEY).as_deref(), Some("usage"));
        assert!(!unit.is_package_root());
    }

    #[test]
    fn test_registry_keeps_insertion_order() {
        let mut registry = UnitRegistry::new();
        for name in ["z", "a", "m.n", "b"] {
            registry.register(Unit::new(name, UnitKind::Module)).unwrap();
        }

        assert_eq!(registry.names(), vec!["z", "a", "m.n", "b"]);
        assert_eq!(registry.len(), 4);
        assert!(registry.contains("m.n"));
        assert!(!registry.contains("m"));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = UnitRegistry::new();
        registry.register(Unit::new("a", UnitKind::Module)).unwrap();
        assert!(registry.register(Unit::new("a", UnitKind::Package)).is_err());
        assert_eq!(registry.get("a").unwrap().kind, UnitKind::Module);
    }

    #[test]
    fn test_registry_stats() {
        let mut registry = UnitRegistry::new();
        registry
            .register(Unit::new("p", UnitKind::Package).with_base_unit(true))
            .unwrap();
        registry
            .register(Unit::new("p.c", UnitKind::Module).with_base_unit(true))
            .unwrap();
        registry
            .register(Unit::new("p.user_parsers", UnitKind::NamespacePackage))
            .unwrap();
        registry.get_mut("p.c").unwrap().mark_reloaded();
        registry.get_mut("p.c").unwrap().mark_reloaded();

        let stats = registry.stats();
        assert_eq!(stats.total_units, 3);
        assert_eq!(stats.packages, 2);
        assert_eq!(stats.base_units, 2);
        assert_eq!(stats.total_reloads, 2);
    }
}

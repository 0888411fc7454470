//! Session-reset intent

use super::registry::{REINIT_KEY, UnitRegistry};
use crate::config::PluginNamespace;

/// Reinit flag of the most recently loaded plugin entry unit
///
/// Scans the registry newest first; the first `parser` or `core` unit under the
/// plugin namespace decides. A missing or non-boolean flag reads as `false`,
/// as does a registry without entry units.
pub fn check_reinit_state(registry: &UnitRegistry, namespace: &PluginNamespace) -> bool {
    registry
        .iter()
        .rev()
        .find(|unit| namespace.is_entry_unit(&unit.name))
        .is_some_and(|unit| unit.flag(REINIT_KEY))
}

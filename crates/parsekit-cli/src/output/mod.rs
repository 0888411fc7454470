//! Output formatting module
//!
//! Reload progress lines and unit listings in table or JSON form.

mod progress;

pub use progress::{ConsoleProgress, PackageProgress};

use comfy_table::{Cell, Color, Table};
use parsekit_plugins::config::PluginNamespace;
use parsekit_plugins::hot_reload::{RegistryStats, Unit, UnitRegistry};
use serde::Serialize;

/// One row of a unit listing
#[derive(Debug, Clone, Serialize)]
pub struct UnitRow {
    pub name: String,
    pub kind: String,
    pub scope: &'static str,
    pub reload_count: u32,
}

impl UnitRow {
    pub fn new(unit: &Unit, namespace: &PluginNamespace) -> Self {
        let scope = if unit.is_base_unit {
            "base"
        } else if namespace.is_plugin_unit(&unit.name) {
            "plugin"
        } else {
            "-"
        };

        Self {
            name: unit.name.clone(),
            kind: unit.kind.to_string(),
            scope,
            reload_count: unit.reload_count,
        }
    }
}

/// Rows for every loaded unit, in load order
pub fn unit_rows(registry: &UnitRegistry, namespace: &PluginNamespace) -> Vec<UnitRow> {
    registry.iter().map(|unit| UnitRow::new(unit, namespace)).collect()
}

/// Render rows as a table
pub fn unit_table(rows: &[UnitRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Unit", "Kind", "Scope", "Reloads"]);

    for row in rows {
        let scope = match row.scope {
            "plugin" => Cell::new(row.scope).fg(Color::Cyan),
            "base" => Cell::new(row.scope).fg(Color::Green),
            _ => Cell::new(row.scope),
        };
        table.add_row(vec![
            Cell::new(&row.name),
            Cell::new(&row.kind),
            scope,
            Cell::new(row.reload_count),
        ]);
    }

    table
}

/// One-line registry summary printed under the table
pub fn stats_line(stats: &RegistryStats) -> String {
    format!(
        "{} units ({} packages, {} base), {} reloads",
        stats.total_units, stats.packages, stats.base_units, stats.total_reloads
    )
}

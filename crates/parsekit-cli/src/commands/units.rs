//! `parsekit units` command implementation

use crate::CliError;
use crate::commands::run::report_resolve_error;
use crate::output::{stats_line, unit_rows, unit_table};
use parsekit_plugins::config::HostConfig;
use parsekit_plugins::host::UnitHost;

/// Execute the `parsekit units` command
pub fn run(config: HostConfig, name: &str, json: bool) -> Result<(), CliError> {
    let mut host = UnitHost::new(config)?;

    let argv = vec!["parsekit".to_string(), name.to_string()];
    if let Err(err) = host.select_parser(&argv) {
        report_resolve_error(&err);
        return Err(err.into());
    }

    let rows = unit_rows(host.registry(), host.namespace());
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", unit_table(&rows));
        println!("{}", stats_line(&host.registry().stats()));
    }

    Ok(())
}

//! `parsekit run` command implementation

use crate::CliError;
use crate::session::{ENTRY_FUNCTION, Session};
use colored::Colorize;
use parsekit_plugins::config::HostConfig;
use parsekit_plugins::host::UnitHost;
use parsekit_plugins::resolver::ResolveError;

/// Program name placed at index 0 of the resolver arguments
const PROGRAM: &str = "parsekit";

/// Execute the `parsekit run` command
pub fn run(config: HostConfig, name: Option<&str>, interactive: bool) -> Result<(), CliError> {
    let mut host = UnitHost::new(config)?;

    let argv: Vec<String> = std::iter::once(PROGRAM)
        .chain(name)
        .map(str::to_string)
        .collect();

    let parser = match host.select_parser(&argv) {
        Ok(unit) => unit.name.clone(),
        Err(err) => {
            report_resolve_error(&err);
            return Err(err.into());
        }
    };

    if interactive {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        Session::new(&mut host, parser).run(stdin.lock(), &mut stdout)?;
    } else {
        let result = host.run_entry(&parser, ENTRY_FUNCTION)?;
        println!("{}", result);
    }

    Ok(())
}

/// Print the diagnostic and remediation lines of a resolution failure
pub fn report_resolve_error(err: &ResolveError) {
    eprintln!("\t{}", err.to_string().red().bold());
    for line in err.remediation() {
        eprintln!("\t{}", line.yellow());
    }
}

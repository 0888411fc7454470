//! Interactive parser session
//!
//! Line-based command loop around a loaded parser. Results of `run` are kept
//! until the newest plugin asks for a reset.

use crate::CliError;
use crate::output::{ConsoleProgress, PackageProgress};
use colored::Colorize;
use parsekit_plugins::host::UnitHost;
use rhai::Dynamic;
use std::io::{BufRead, Write};

/// Entry function of parser units
pub const ENTRY_FUNCTION: &str = "main";

const PROMPT: &str = "parsekit> ";

const HELP: &str = "\
Commands:
  run              call the parser entry point
  reload           reload every loaded unit
  reload <pkg>     reload one parser package
  reinit           drop kept results if the newest parser asks for it
  history          show kept results
  units            list loaded units
  repl             show the parser's usage snippets
  help             show this help
  quit             leave the session";

/// Interactive session state
pub struct Session<'h> {
    host: &'h mut UnitHost,
    parser: String,
    results: Vec<Dynamic>,
}

impl<'h> Session<'h> {
    pub fn new(host: &'h mut UnitHost, parser: String) -> Self {
        Self {
            host,
            parser,
            results: Vec::new(),
        }
    }

    /// Results kept since the last reset
    pub fn results(&self) -> &[Dynamic] {
        &self.results
    }

    /// Read commands until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<(), CliError> {
        writeln!(out, "{} {}", "Loaded".green(), self.parser.cyan())?;
        writeln!(out, "Type {} for commands.", "help".yellow())?;

        write!(out, "{PROMPT}")?;
        out.flush()?;

        for line in input.lines() {
            let line = line?;
            let mut words = line.split_whitespace();

            match (words.next(), words.next()) {
                (None, _) => {}
                (Some("quit" | "exit"), _) => break,
                (Some("help"), _) => writeln!(out, "{HELP}")?,
                (Some("run"), _) => self.run_entry(out)?,
                (Some("reload"), None) => self.reload_all(out)?,
                (Some("reload"), Some(package)) => self.reload_package(package, out)?,
                (Some("reinit"), _) => self.reinit(out)?,
                (Some("history"), _) => {
                    for (i, result) in self.results().iter().enumerate() {
                        writeln!(out, "  [{}] {}", i + 1, result)?;
                    }
                }
                (Some("units"), _) => {
                    for unit in self.host.registry() {
                        writeln!(out, "  {}", unit.name)?;
                    }
                }
                (Some("repl"), _) => match self.host.repl_snippets(&self.parser) {
                    Some(snippets) => write!(out, "{snippets}")?,
                    None => writeln!(out, "{}", "No usage info".yellow())?,
                },
                (Some(other), _) => writeln!(out, "{} {}", "Unknown command:".red(), other)?,
            }

            write!(out, "{PROMPT}")?;
            out.flush()?;
        }

        writeln!(out)?;
        Ok(())
    }

    fn run_entry<W: Write>(&mut self, out: &mut W) -> Result<(), CliError> {
        match self.host.run_entry(&self.parser, ENTRY_FUNCTION) {
            Ok(result) => {
                writeln!(out, "{result}")?;
                self.results.push(result);
            }
            Err(err) => writeln!(out, "{} {}", "✗".red(), err)?,
        }
        Ok(())
    }

    fn reload_all<W: Write>(&mut self, out: &mut W) -> Result<(), CliError> {
        let prefix = self.host.config().reload_prefix();
        let result = self.host.reload_all(&prefix, &mut ConsoleProgress::new(out));

        if let Err(err) = result {
            writeln!(out)?;
            writeln!(out, "{} {}", "✗".red(), err)?;
            return Ok(());
        }
        self.reinit(out)
    }

    fn reload_package<W: Write>(&mut self, package: &str, out: &mut W) -> Result<(), CliError> {
        let result = self.host.reload_package(package, &mut PackageProgress::new(out));

        if let Err(err) = result {
            writeln!(out, "{} {}", "✗".red(), err)?;
        }
        Ok(())
    }

    fn reinit<W: Write>(&mut self, out: &mut W) -> Result<(), CliError> {
        if self.host.check_reinit_state() {
            self.results.clear();
            writeln!(out, "{}", "Session state reset".yellow())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsekit_plugins::config::HostConfig;
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;

    fn write(root: &Path, relative: &str, body: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn run_session(root: &Path, parser_body: &str, commands: &str) -> (String, usize) {
        colored::control::set_override(false);
        write(root, "parsers/mod.rhai", "let version = 1;");
        write(root, "parsers/user_parsers/demo/mod.rhai", "");
        write(root, "parsers/user_parsers/demo/parser.rhai", parser_body);

        let mut host = UnitHost::new(HostConfig::new().with_source_root(root)).unwrap();
        let argv = vec!["parsekit".to_string(), "demo".to_string()];
        let parser = host.select_parser(&argv).unwrap().name.clone();

        let mut session = Session::new(&mut host, parser);
        let mut out = Vec::new();
        session.run(Cursor::new(commands.to_string()), &mut out).unwrap();
        let kept = session.results().len();

        (String::from_utf8(out).unwrap(), kept)
    }

    #[test]
    fn test_run_keeps_results_without_reinit() {
        let dir = tempfile::tempdir().unwrap();
        let (out, kept) = run_session(
            dir.path(),
            "let reinit = false;\nfn main() { 7 }",
            "run\nrun\nreload\nhistory\nquit\nrun\n",
        );

        assert_eq!(kept, 2);
        assert!(out.contains("  [2] 7"));
        assert!(out.contains("  reloading 'parsers.user_parsers.demo.parser'..."));
        assert!(out.contains("  └── 2 modules successfully reloaded"));
        assert!(!out.contains("Session state reset"));
    }

    #[test]
    fn test_reload_with_reinit_clears_results() {
        let dir = tempfile::tempdir().unwrap();
        let (out, kept) = run_session(dir.path(), "let reinit = true;\nfn main() { 7 }", "run\nreload\n");

        assert_eq!(kept, 0);
        assert!(out.contains("Session state reset"));
    }

    #[test]
    fn test_failures_keep_session_alive() {
        let dir = tempfile::tempdir().unwrap();
        let (out, _) = run_session(
            dir.path(),
            "fn main() { raise_notfound(\"title\") }",
            "reload nonexistent\nrun\nbogus\nreload demo\n",
        );

        assert!(out.contains("No module named 'nonexistent'"));
        assert!(out.contains("Parsed object has no tag 'title'"));
        assert!(out.contains("Unknown command: bogus"));
        assert!(out.contains("- 'parsers.user_parsers.demo' successfully reloaded"));
    }

    #[test]
    fn test_repl_snippets() {
        let dir = tempfile::tempdir().unwrap();
        let (out, _) = run_session(
            dir.path(),
            "let info = \"Demo\\n    >>> run\\n\";\nfn main() { 1 }",
            "repl\n",
        );

        assert!(out.contains(">>> run\n"));
    }
}

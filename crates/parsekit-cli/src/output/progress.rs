//! Console reload reporting

use colored::Colorize;
use parsekit_plugins::hot_reload::ReloadProgress;
use std::io::Write;

/// Column the `[ok]` marker of a full reload is aligned to
pub const RIGHT_PADDING: usize = 50;

const OK_MARKER: &str = " [ok]";

/// Per-unit lines of a full reload
pub struct ConsoleProgress<'w, W: Write> {
    out: &'w mut W,
}

impl<'w, W: Write> ConsoleProgress<'w, W> {
    pub fn new(out: &'w mut W) -> Self {
        Self { out }
    }
}

impl<W: Write> ReloadProgress for ConsoleProgress<'_, W> {
    fn reloading(&mut self, name: &str) {
        let _ = write!(self.out, "  reloading '{}'...", name);
        let _ = self.out.flush();
    }

    fn reloaded(&mut self, name: &str) {
        let width = RIGHT_PADDING.saturating_sub(name.len());
        let pad = width.saturating_sub(OK_MARKER.len());
        let _ = writeln!(self.out, "{}{}", " ".repeat(pad), OK_MARKER.green());
    }

    fn finished(&mut self, count: usize) {
        let _ = writeln!(self.out, "  └── {} modules successfully reloaded\n", count);
    }
}

/// Lines of a single package reload
pub struct PackageProgress<'w, W: Write> {
    out: &'w mut W,
}

impl<'w, W: Write> PackageProgress<'w, W> {
    pub fn new(out: &'w mut W) -> Self {
        Self { out }
    }
}

impl<W: Write> ReloadProgress for PackageProgress<'_, W> {
    fn reloading(&mut self, name: &str) {
        let _ = writeln!(self.out, "reloading '{}'...", name);
    }

    fn reloaded(&mut self, name: &str) {
        let _ = writeln!(self.out, "- '{}' successfully reloaded\n", name.cyan());
    }
}

//! Plugin host for parser units
//!
//! Provides:
//! - Name-based plugin resolution with operator-facing diagnostics
//! - Dependency-ordered hot reload of loaded units
//! - Scoped reload of one plugin package located by partial name
//! - Session reset intent recovered from the newest plugin
//! - Tag-specific not-found errors created on demand

pub mod config;
pub mod error;
pub mod host;
pub mod hot_reload;
pub mod resolver;

pub use config::{ConfigError, HostConfig, PluginNamespace, ScriptLimits};
pub use error::{ElementNotFoundError, NotFoundKind, ParserError, not_found_factory, raise_not_found};
pub use host::{HostError, UnitHost, repl_snippets};
pub use hot_reload::{LoadError, ReloadError, ReloadProgress, Unit, UnitKind, UnitRegistry};
pub use resolver::{ArgumentIndexError, ResolveError};

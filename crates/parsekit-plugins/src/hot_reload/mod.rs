//! Hot-reload support for script units
//!
//! - Loading units and their ancestor packages on demand
//! - Re-executing loaded units in base-first, deepest-plugin-first order
//! - Locating a plugin package from a partial name
//! - Recovering the reinit intent of the newest plugin

mod loader;
mod manager;
mod progress;
mod registry;
mod reinit;

pub use loader::{LoadError, SCRIPT_LOG_TARGET, ScriptLoader, UnitSource};
pub use manager::{ReloadError, find_package, reload_order};
pub use progress::{ReloadProgress, SilentProgress, TracingProgress};
pub use registry::{
    BodyState, INFO_KEY, REINIT_KEY, RegistryStats, Unit, UnitKind, UnitRegistry, owner_package_of, parent_of,
};
pub use reinit::check_reinit_state;

//! Reload progress reporting

use tracing::info;

/// Write-only sink notified while units are re-executed
pub trait ReloadProgress {
    /// Called before `name` is re-executed
    fn reloading(&mut self, _name: &str) {}

    /// Called after `name` was re-executed successfully
    fn reloaded(&mut self, _name: &str) {}

    /// Called once a full reload completed
    fn finished(&mut self, _count: usize) {}
}

/// Sink that reports through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ReloadProgress for TracingProgress {
    fn reloaded(&mut self, name: &str) {
        info!("Reloaded unit: {}", name);
    }

    fn finished(&mut self, count: usize) {
        info!("{} modules successfully reloaded", count);
    }
}

/// Sink that discards every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ReloadProgress for SilentProgress {}

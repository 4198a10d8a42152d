//! Compute backend trait and device description.
//!
//! The [`ComputeBackend`] trait abstracts over execution strategies so that
//! the curve builder in `hom-core` never spawns threads itself.

use thiserror::Error;

/// Errors originating from compute backends.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Backend not available: {0}")]
    Unavailable(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Describes a compute backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend_type: BackendType,
    pub threads: usize,
}

/// The type of compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Cpu,
    Serial,
}

/// Abstraction over execution backends.
///
/// Tasks are identified by index. Each task owns its output slot, so no
/// synchronisation between tasks is needed. A task returns `false` to signal
/// a hard failure; the backend then stops scheduling further work as soon as
/// it can.
pub trait ComputeBackend: Send + Sync {
    /// Return information about the backend.
    fn device_info(&self) -> DeviceInfo;

    /// Run `task(i)` for every `i` in `0..len`.
    ///
    /// Returns `Ok(true)` if every task succeeded, `Ok(false)` if a task
    /// reported failure (some tasks may then not have run).
    fn for_each_index(
        &self,
        len: usize,
        task: &(dyn Fn(usize) -> bool + Send + Sync),
    ) -> Result<bool, ComputeError>;
}

//! # HOM Compute
//!
//! Execution backends for the HOM framework. The
//! [`ComputeBackend`](backend::ComputeBackend) trait isolates the physics in
//! `hom-core` from how independent per-delay tasks are scheduled.
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Notes |
//! |---------|-------------|-------|
//! | CPU (Rayon) | `cpu` (default) | Work-stealing across delay points |
//! | Serial | always | Sweep order, stops at the first failure |

pub mod backend;
pub mod serial;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo};
pub use serial::SerialBackend;

#[cfg(feature = "cpu")]
pub use cpu::CpuBackend;

/// The backend used when the caller does not choose one.
#[cfg(feature = "cpu")]
pub fn default_backend() -> std::sync::Arc<dyn ComputeBackend> {
    std::sync::Arc::new(CpuBackend::new())
}

/// The backend used when the caller does not choose one.
#[cfg(not(feature = "cpu"))]
pub fn default_backend() -> std::sync::Arc<dyn ComputeBackend> {
    std::sync::Arc::new(SerialBackend)
}

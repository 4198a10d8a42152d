//! CPU compute backend using Rayon for shared-memory parallelism.

use rayon::prelude::*;

use crate::backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo};

/// CPU backend that spreads per-delay tasks across threads via Rayon.
///
/// With no explicit thread count the global Rayon pool is used; otherwise a
/// dedicated pool is built for each call.
pub struct CpuBackend {
    num_threads: Option<usize>,
}

impl CpuBackend {
    /// Create a new CPU backend using the global Rayon pool.
    pub fn new() -> Self {
        Self { num_threads: None }
    }

    /// Create a CPU backend with a specified thread count.
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads.max(1)),
        }
    }

    fn threads(&self) -> usize {
        self.num_threads.unwrap_or_else(rayon::current_num_threads)
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn run_parallel(len: usize, task: &(dyn Fn(usize) -> bool + Send + Sync)) -> bool {
    (0..len)
        .into_par_iter()
        .try_for_each(|i| if task(i) { Ok(()) } else { Err(()) })
        .is_ok()
}

impl ComputeBackend for CpuBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: format!("CPU ({} threads)", self.threads()),
            backend_type: BackendType::Cpu,
            threads: self.threads(),
        }
    }

    fn for_each_index(
        &self,
        len: usize,
        task: &(dyn Fn(usize) -> bool + Send + Sync),
    ) -> Result<bool, ComputeError> {
        match self.num_threads {
            None => Ok(run_parallel(len, task)),
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ComputeError::ThreadPool(e.to_string()))?;
                Ok(pool.install(|| run_parallel(len, task)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    #[test]
    fn test_every_slot_is_filled() {
        let slots: Vec<OnceLock<usize>> = (0..100).map(|_| OnceLock::new()).collect();
        let ok = CpuBackend::with_threads(4)
            .for_each_index(slots.len(), &|i| slots[i].set(i * i).is_ok())
            .unwrap();
        assert!(ok);
        for (i, slot) in slots.iter().enumerate() {
            assert_eq!(slot.get(), Some(&(i * i)));
        }
    }

    #[test]
    fn test_failure_is_reported() {
        let ok = CpuBackend::new().for_each_index(50, &|i| i != 17).unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_device_info_reports_threads() {
        let info = CpuBackend::with_threads(3).device_info();
        assert_eq!(info.backend_type, BackendType::Cpu);
        assert_eq!(info.threads, 3);
    }
}

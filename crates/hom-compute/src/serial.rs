//! Single-threaded backend.

use crate::backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo};

/// Runs tasks in index order on the calling thread, stopping at the first
/// failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

impl ComputeBackend for SerialBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Serial".into(),
            backend_type: BackendType::Serial,
            threads: 1,
        }
    }

    fn for_each_index(
        &self,
        len: usize,
        task: &(dyn Fn(usize) -> bool + Send + Sync),
    ) -> Result<bool, ComputeError> {
        Ok((0..len).all(task))
    }
}

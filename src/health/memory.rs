//! Process memory sampling.

use serde::Serialize;
use sysinfo::{ProcessesToUpdate, System};

const MB: u64 = 1024 * 1024;

/// Memory used by this process, in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub resident_mb: u64,
    pub virtual_mb: u64,
}

impl MemoryUsage {
    pub fn from_bytes(resident: u64, virtual_bytes: u64) -> Self {
        Self {
            resident_mb: resident / MB,
            virtual_mb: virtual_bytes / MB,
        }
    }
}

/// Sample the current process. Blocking; call from `spawn_blocking`.
///
/// Returns `None` on platforms where sysinfo cannot see the process.
pub fn sample_memory() -> Option<MemoryUsage> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    let process = system.process(pid)?;
    Some(MemoryUsage::from_bytes(process.memory(), process.virtual_memory()))
}

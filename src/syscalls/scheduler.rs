/*!
 * Scheduler Syscalls
 * Yield and CPU affinity
 */

use super::executor::SyscallExecutor;
use super::types::SyscallResult;
use crate::core::errors::ProcessError;
use crate::core::types::{Pid, RawPid};
use crate::process::SchedulingControl;
use crate::scheduler::cpuset::CpuSet;
use tracing::trace;

impl SyscallExecutor {
    /// Always succeeds, even when the caller is not on a CPU
    pub(super) fn sched_yield(&self, caller: Pid) -> SyscallResult {
        let yielded = self.manager.yield_now(caller);
        trace!(pid = caller, yielded, "sched_yield");
        SyscallResult::success()
    }

    pub(super) fn sched_setaffinity(&self, caller: Pid, pid: RawPid, cpus: CpuSet) -> SyscallResult {
        self.target(caller, pid)
            .and_then(|target| self.manager.set_affinity(target, cpus))
            .map(|_| 0)
            .into()
    }

    /// Affinity as a 64-bit mask
    pub(super) fn sched_getaffinity(&self, caller: Pid, pid: RawPid) -> SyscallResult {
        self.target(caller, pid)
            .and_then(|target| self.manager.affinity(target))
            .and_then(|cpus| {
                cpus.to_mask().ok_or_else(|| {
                    ProcessError::invalid_argument(format!("affinity {} does not fit a 64-bit mask", cpus))
                })
            })
            .map(|mask| mask as i64)
            .into()
    }
}

/*!
 * Process Syscalls
 * Lineage, priority and lifecycle operations
 */

use super::executor::SyscallExecutor;
use super::types::SyscallResult;
use crate::core::limits::INIT_PID;
use crate::core::types::{Pid, RawPid};
use crate::process::{ProcessLifecycle, ProcessLineage, SchedulingControl};
use tracing::{debug, info};

impl SyscallExecutor {
    pub(super) fn ancestor_pid(&self, caller: Pid, pid: RawPid, n: u32) -> SyscallResult {
        self.manager.ancestor_pid(caller, pid, n).into()
    }

    pub(super) fn propagate_nice(&self, caller: Pid, increment: i32) -> SyscallResult {
        match self.manager.propagate_nice(caller, increment) {
            Ok(out) => {
                info!(
                    pid = caller,
                    increment,
                    niceness = out.niceness,
                    descendants = out.descendants_visited,
                    "Niceness propagated"
                );
                SyscallResult::value(out.niceness as i64)
            }
            Err(e) => e.into(),
        }
    }

    pub(super) fn set_priority(&self, caller: Pid, pid: RawPid, niceness: i64) -> SyscallResult {
        let result = self
            .target(caller, pid)
            .and_then(|target| self.manager.set_niceness(target, niceness));
        match result {
            Ok(applied) => {
                debug!(pid = caller, target = pid, niceness = applied, "setpriority");
                SyscallResult::success()
            }
            Err(e) => e.into(),
        }
    }

    pub(super) fn get_priority(&self, caller: Pid, pid: RawPid) -> SyscallResult {
        self.target(caller, pid)
            .and_then(|target| self.manager.niceness(target))
            .into()
    }

    pub(super) fn getpid(&self, caller: Pid) -> SyscallResult {
        self.manager.table().live(caller).map(|r| r.pid()).into()
    }

    /// Parent pid, or 0 for init
    pub(super) fn getppid(&self, caller: Pid) -> SyscallResult {
        self.manager
            .table()
            .live(caller)
            .map(|r| r.ppid().unwrap_or(0))
            .into()
    }

    pub(super) fn fork(&self, caller: Pid, name: String) -> SyscallResult {
        self.manager.fork(caller, name).into()
    }

    /// Exit the caller; init's zombies are reaped right away
    pub(super) fn exit(&self, caller: Pid) -> SyscallResult {
        let result = self.manager.exit(caller).map(|_| {
            if self.manager.table().get(caller).and_then(|r| r.ppid()) == Some(INIT_PID) {
                self.manager.reap_orphans();
            }
            0
        });
        result.into()
    }
}

/*!
 * Syscall Executor
 * Decodes syscalls and dispatches them to the process subsystem
 */

use super::types::{Syscall, SyscallResult};
use crate::core::errors::ProcessError;
use crate::core::limits::*;
use crate::core::types::{Pid, ProcessResult, RawPid};
use crate::monitoring::span_syscall;
use crate::process::ProcessManager;
use crate::scheduler::cpuset::CpuSet;
use nix::errno::Errno;
use tracing::{debug, warn};

/// Syscall executor bound to one process manager
#[derive(Clone)]
pub struct SyscallExecutor {
    pub(super) manager: ProcessManager,
}

impl SyscallExecutor {
    pub fn new(manager: ProcessManager) -> Self {
        Self { manager }
    }

    #[inline]
    pub fn manager(&self) -> &ProcessManager {
        &self.manager
    }

    /// Execute a typed syscall on behalf of `caller`
    pub fn execute(&self, caller: Pid, syscall: Syscall) -> SyscallResult {
        let span = span_syscall(syscall.name(), caller);
        let _guard = span.enter();

        debug!(
            pid = caller,
            syscall = syscall.name(),
            trace_id = %span.trace_id(),
            "Executing syscall"
        );

        let result = match syscall {
            Syscall::AncestorPid { pid, n } => self.ancestor_pid(caller, pid, n),
            Syscall::PropagateNice { increment } => self.propagate_nice(caller, increment),
            Syscall::SetPriority { pid, niceness } => self.set_priority(caller, pid, niceness),
            Syscall::GetPriority { pid } => self.get_priority(caller, pid),
            Syscall::GetPid => self.getpid(caller),
            Syscall::GetPpid => self.getppid(caller),
            Syscall::Fork { name } => self.fork(caller, name),
            Syscall::Exit => self.exit(caller),
            Syscall::SchedYield => self.sched_yield(caller),
            Syscall::SchedSetAffinity { pid, cpus } => self.sched_setaffinity(caller, pid, cpus),
            Syscall::SchedGetAffinity { pid } => self.sched_getaffinity(caller, pid),
        };

        match &result {
            SyscallResult::Value { value } => span.record_return(*value),
            SyscallResult::Error { errno, .. } => span.record_errno(*errno),
        }
        result
    }

    /// Raw entry point: syscall number plus register-style arguments
    ///
    /// Returns the value on success and `-errno` on failure; unknown
    /// numbers give `-ENOSYS`. Missing arguments read as zero.
    pub fn syscall(&self, caller: Pid, nr: u64, args: &[i64]) -> i64 {
        let arg = |i: usize| args.get(i).copied().unwrap_or(0);

        let syscall = match nr {
            SYS_ANCESTOR_PID => Syscall::AncestorPid {
                pid: arg(0) as RawPid,
                n: arg(1) as u32,
            },
            SYS_PROPAGATE_NICE => Syscall::PropagateNice {
                increment: arg(0) as i32,
            },
            SYS_SETPRIORITY => {
                if arg(0) != PRIO_PROCESS {
                    return -(Errno::EINVAL as i64);
                }
                Syscall::SetPriority {
                    pid: arg(1) as RawPid,
                    niceness: arg(2),
                }
            }
            SYS_GETPRIORITY => {
                if arg(0) != PRIO_PROCESS {
                    return -(Errno::EINVAL as i64);
                }
                let result = self.execute(
                    caller,
                    Syscall::GetPriority {
                        pid: arg(1) as RawPid,
                    },
                );
                return match result {
                    SyscallResult::Value { value } => PRIO_RAW_OFFSET - value,
                    err => err.raw(),
                };
            }
            SYS_GETPID => Syscall::GetPid,
            SYS_GETPPID => Syscall::GetPpid,
            SYS_SCHED_YIELD => Syscall::SchedYield,
            SYS_SCHED_SETAFFINITY => Syscall::SchedSetAffinity {
                pid: arg(0) as RawPid,
                cpus: CpuSet::from_mask(arg(1) as u64),
            },
            SYS_SCHED_GETAFFINITY => Syscall::SchedGetAffinity {
                pid: arg(0) as RawPid,
            },
            _ => {
                warn!(pid = caller, nr, "Unknown syscall number");
                return -(Errno::ENOSYS as i64);
            }
        };

        self.execute(caller, syscall).raw()
    }

    /// Resolve a pid argument where 0 names the caller
    pub(super) fn target(&self, caller: Pid, pid: RawPid) -> ProcessResult<Pid> {
        match pid {
            0 => Ok(caller),
            p if p < 0 => Err(ProcessError::no_such_process(p)),
            p => Ok(p as Pid),
        }
    }
}

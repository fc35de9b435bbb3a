/*!
 * Process Traits
 * Process management abstractions
 */

use super::nice::Propagation;
use super::types::ProcessInfo;
use crate::core::types::{Nice, Pid, ProcessResult, RawPid};
use crate::scheduler::cpuset::CpuSet;
use crate::scheduler::stats::SchedStat;

/// Process lifecycle management
pub trait ProcessLifecycle: Send + Sync {
    /// Create a child of `parent`
    fn fork(&self, parent: Pid, name: String) -> ProcessResult<Pid>;

    /// Turn a live process into a zombie
    fn exit(&self, pid: Pid) -> ProcessResult<()>;

    /// Remove a zombie child from the table
    fn reap(&self, parent: Pid, child: Pid) -> ProcessResult<()>;

    /// Whether `pid` names a live process
    fn exists(&self, pid: Pid) -> bool;

    fn get_process(&self, pid: Pid) -> Option<ProcessInfo>;

    fn list_processes(&self) -> Vec<ProcessInfo>;
}

/// Tree-wide queries and updates
pub trait ProcessLineage: Send + Sync {
    /// `n`th ancestor of `pid` (0 = caller)
    fn ancestor_pid(&self, caller: Pid, pid: RawPid, n: u32) -> ProcessResult<Pid>;

    /// Raise the caller's niceness and decay it down the subtree
    fn propagate_nice(&self, caller: Pid, increment: i32) -> ProcessResult<Propagation>;
}

/// Per-process scheduling attributes
pub trait SchedulingControl: Send + Sync {
    fn set_niceness(&self, pid: Pid, value: i64) -> ProcessResult<Nice>;

    fn niceness(&self, pid: Pid) -> ProcessResult<Nice>;

    fn set_affinity(&self, pid: Pid, cpus: CpuSet) -> ProcessResult<()>;

    fn affinity(&self, pid: Pid) -> ProcessResult<CpuSet>;

    /// Current epoch statistics
    fn schedstat(&self, pid: Pid) -> ProcessResult<SchedStat>;
}

/*!
 * Lineage Kernel Library
 * Process-tree extensions: ancestry lookup, niceness propagation and
 * epoch-windowed scheduler accounting
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod scheduler;
pub mod syscalls;

// Re-exports
pub use crate::core::{ConfigError, KernelConfig, ProcessError};
pub use crate::core::types::{CpuId, Nice, Pid, ProcessResult, RawPid, Timestamp};
pub use monitoring::{init_tracing, span_operation, span_syscall};
pub use process::{
    ProcessInfo, ProcessLifecycle, ProcessLineage, ProcessManager, ProcessManagerBuilder,
    ProcessState, Propagation, SchedulingControl,
};
pub use scheduler::{Clock, CpuSet, DispatcherTask, ManualClock, MonotonicClock, SchedStat};
pub use syscalls::{Syscall, SyscallExecutor, SyscallResult};

/*!
 * Syscall Types
 * Typed syscall requests and their results
 */

use crate::core::errors::ProcessError;
use crate::core::types::RawPid;
use crate::scheduler::cpuset::CpuSet;
use serde::{Deserialize, Serialize};

/// System call requests, issued on behalf of a calling pid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "syscall")]
pub enum Syscall {
    /// `n`th ancestor of `pid`; `pid == 0` is the caller
    AncestorPid { pid: RawPid, n: u32 },
    /// Raise the caller's niceness and decay it down the subtree
    PropagateNice { increment: i32 },
    /// `pid == 0` is the caller
    SetPriority { pid: RawPid, niceness: i64 },
    GetPriority { pid: RawPid },
    GetPid,
    GetPpid,
    Fork { name: String },
    Exit,
    SchedYield,
    SchedSetAffinity { pid: RawPid, cpus: CpuSet },
    SchedGetAffinity { pid: RawPid },
}

impl Syscall {
    /// Stable name for tracing
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AncestorPid { .. } => "ancestor_pid",
            Self::PropagateNice { .. } => "propagate_nice",
            Self::SetPriority { .. } => "setpriority",
            Self::GetPriority { .. } => "getpriority",
            Self::GetPid => "getpid",
            Self::GetPpid => "getppid",
            Self::Fork { .. } => "fork",
            Self::Exit => "exit",
            Self::SchedYield => "sched_yield",
            Self::SchedSetAffinity { .. } => "sched_setaffinity",
            Self::SchedGetAffinity { .. } => "sched_getaffinity",
        }
    }
}

/// System call result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SyscallResult {
    /// Successful call with its return value
    Value { value: i64 },
    /// Failed call with the errno reported to the caller
    Error { errno: i32, message: String },
}

impl SyscallResult {
    #[inline]
    #[must_use]
    pub const fn value(value: i64) -> Self {
        Self::Value { value }
    }

    #[inline]
    #[must_use]
    pub const fn success() -> Self {
        Self::Value { value: 0 }
    }

    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Value { .. })
    }

    #[inline]
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Linux return convention: the value, or `-errno`
    #[inline]
    #[must_use]
    pub const fn raw(&self) -> i64 {
        match self {
            Self::Value { value } => *value,
            Self::Error { errno, .. } => -(*errno as i64),
        }
    }

    #[inline]
    #[must_use]
    pub const fn errno(&self) -> Option<i32> {
        match self {
            Self::Value { .. } => None,
            Self::Error { errno, .. } => Some(*errno),
        }
    }
}

impl From<ProcessError> for SyscallResult {
    fn from(err: ProcessError) -> Self {
        Self::Error {
            errno: err.errno() as i32,
            message: err.to_string(),
        }
    }
}

impl<T: Into<i64>> From<Result<T, ProcessError>> for SyscallResult {
    fn from(result: Result<T, ProcessError>) -> Self {
        match result {
            Ok(value) => Self::value(value.into()),
            Err(err) => err.into(),
        }
    }
}

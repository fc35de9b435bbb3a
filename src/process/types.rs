/*!
 * Process Types
 * Common types for process management
 */

use crate::core::types::{Nice, Pid};
use crate::scheduler::cpuset::CpuSet;
use serde::{Deserialize, Serialize};

/// Process state
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Waiting in the run queue
    Runnable = 0,
    /// On a CPU
    Running = 1,
    /// Blocked until woken
    Sleeping = 2,
    /// Exited but not yet reaped by its parent
    Zombie = 3,
}

impl ProcessState {
    #[inline(always)]
    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Runnable,
            1 => Self::Running,
            2 => Self::Sleeping,
            _ => Self::Zombie,
        }
    }

    /// Anything but a zombie
    #[inline(always)]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !matches!(self, Self::Zombie)
    }
}

/// Point-in-time process metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppid: Option<Pid>,
    pub name: String,
    pub state: ProcessState,
    pub niceness: Nice,
    pub affinity: CpuSet,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<Pid>,
}

impl ProcessInfo {
    #[inline(always)]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.state.is_alive()
    }
}

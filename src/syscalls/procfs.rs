/*!
 * Procfs
 * Read-only `/proc/<pid>/...` files backed by the process table
 */

use super::executor::SyscallExecutor;
use crate::core::errors::ProcessError;
use crate::core::types::{Pid, ProcessResult};
use crate::process::SchedulingControl;
use std::str::FromStr;

/// Files exposed under each process directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcFile {
    /// `<exec_ns> <wait_ns> <slices> [<cpu_list>]`
    SchedStat,
}

/// Which process a path refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcTarget {
    SelfProcess,
    Pid(Pid),
}

/// Parsed procfs path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcPath {
    pub target: ProcTarget,
    pub file: ProcFile,
}

impl FromStr for ProcPath {
    type Err = ProcessError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let unknown = || ProcessError::invalid_argument(format!("unknown procfs path '{}'", path));

        let rest = path.strip_prefix("/proc/").ok_or_else(unknown)?;
        let (who, file) = rest.split_once('/').ok_or_else(unknown)?;

        let target = match who {
            "self" => ProcTarget::SelfProcess,
            pid => ProcTarget::Pid(pid.parse().map_err(|_| unknown())?),
        };
        let file = match file {
            "schedstat" => ProcFile::SchedStat,
            _ => return Err(unknown()),
        };

        Ok(Self { target, file })
    }
}

impl SyscallExecutor {
    /// Read a procfs file as `caller`
    ///
    /// Zombies stay readable until reaped.
    pub fn read_proc(&self, caller: Pid, path: &str) -> ProcessResult<String> {
        let parsed: ProcPath = path.parse()?;
        let pid = match parsed.target {
            ProcTarget::SelfProcess => caller,
            ProcTarget::Pid(pid) => pid,
        };

        match parsed.file {
            ProcFile::SchedStat => Ok(format!("{}\n", self.manager.schedstat(pid)?)),
        }
    }
}

/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process-related errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error("No such process: {0}")]
    #[diagnostic(
        code(process::no_such_process),
        help("The process may have exited or never existed. Check PID validity.")
    )]
    NoSuchProcess(i64),

    #[error("Process {pid} has no ancestor {depth} generation(s) up")]
    #[diagnostic(
        code(process::no_such_ancestor),
        help("The ancestry chain reached the root before the requested depth.")
    )]
    NoSuchAncestor { pid: u32, depth: u32 },

    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(process::invalid_argument),
        help("Check the argument range accepted by this operation.")
    )]
    InvalidArgument(String),

    #[error("Process limit reached: {0}")]
    #[diagnostic(
        code(process::limit_reached),
        help("The PID space is exhausted. Reap exited processes to free PIDs.")
    )]
    LimitReached(String),
}

impl ProcessError {
    /// Create a no-such-process error from any pid representation
    #[inline]
    pub fn no_such_process(pid: impl Into<i64>) -> Self {
        Self::NoSuchProcess(pid.into())
    }

    /// Create an invalid argument error
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Errno reported across the syscall boundary
    #[must_use]
    pub const fn errno(&self) -> Errno {
        match self {
            Self::NoSuchProcess(_) => Errno::ESRCH,
            Self::NoSuchAncestor { .. } => Errno::ENOENT,
            Self::InvalidArgument(_) => Errno::EINVAL,
            Self::LimitReached(_) => Errno::EAGAIN,
        }
    }
}

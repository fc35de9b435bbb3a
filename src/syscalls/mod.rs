/*!
 * Syscalls Module
 * Syscall-style entry points over the process subsystem
 */

mod executor;
mod process;
mod procfs;
mod scheduler;
mod types;

// Re-export public API
pub use executor::SyscallExecutor;
pub use procfs::{ProcFile, ProcPath, ProcTarget};
pub use types::{Syscall, SyscallResult};

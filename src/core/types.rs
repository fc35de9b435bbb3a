/*!
 * Core Types
 * Common types used across the kernel
 */

/// Process ID type
pub type Pid = u32;

/// Process ID as passed across the syscall boundary (`pid_t`)
///
/// Zero selects the calling process and negative values never name a process.
pub type RawPid = i32;

/// Scheduling niceness (-20..=19, higher is less favourable)
pub type Nice = i32;

/// Logical CPU identifier
pub type CpuId = u32;

/// Monotonic timestamp in nanoseconds
pub type Timestamp = u64;

/// Common result type for process operations
pub type ProcessResult<T> = Result<T, super::errors::ProcessError>;

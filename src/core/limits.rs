/*!
 * System Limits and Constants
 *
 * Centralized location for system-wide limits, thresholds, and magic numbers.
 * Linux-compatible values are marked with [LINUX-COMPAT]
 */

use std::time::Duration;

// =============================================================================
// PROCESS LIMITS
// =============================================================================

/// PID of the init process (root of the process tree and reaper of orphans)
pub const INIT_PID: u32 = 1;

/// Highest PID handed out before allocation wraps around
/// [LINUX-COMPAT] Default /proc/sys/kernel/pid_max
pub const PID_MAX: u32 = 32_768;

// =============================================================================
// NICENESS
// =============================================================================

/// Most favourable niceness
/// [LINUX-COMPAT]
pub const NICE_MIN: i32 = -20;

/// Least favourable niceness
/// [LINUX-COMPAT]
pub const NICE_MAX: i32 = 19;

/// Niceness of init and of processes that never changed it
pub const NICE_DEFAULT: i32 = 0;

// =============================================================================
// SCHEDULING
// =============================================================================

/// Maximum number of CPUs a CpuSet can describe
pub const MAX_CPUS: usize = 256;

/// Default number of simulated CPUs
pub const DEFAULT_CPUS: usize = 4;

/// Length of a CPU-usage accounting epoch
pub const DEFAULT_EPOCH_LENGTH: Duration = Duration::from_secs(10);

/// Default dispatch quantum (10ms)
pub const DEFAULT_QUANTUM: Duration = Duration::from_millis(10);

/// Longest accepted accounting epoch (one day)
pub const MAX_EPOCH_LENGTH: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest accepted dispatch quantum
pub const MAX_QUANTUM: Duration = Duration::from_secs(60);

// =============================================================================
// SYSCALL NUMBERS
// =============================================================================

/// `ancestor_pid(pid, n)`
pub const SYS_ANCESTOR_PID: u64 = 463;

/// `propagate_nice(increment)`
pub const SYS_PROPAGATE_NICE: u64 = 464;

/// `setpriority(PRIO_PROCESS, 0, value)` on the caller
/// [LINUX-COMPAT] x86_64 number
pub const SYS_SETPRIORITY: u64 = 141;

/// `getpriority(PRIO_PROCESS, 0)` on the caller
/// [LINUX-COMPAT] x86_64 number
pub const SYS_GETPRIORITY: u64 = 140;

/// [LINUX-COMPAT] x86_64 number
pub const SYS_SCHED_YIELD: u64 = 24;

/// [LINUX-COMPAT] x86_64 number
pub const SYS_GETPID: u64 = 39;

/// [LINUX-COMPAT] x86_64 number
pub const SYS_GETPPID: u64 = 110;

/// `sched_setaffinity(pid, mask)` with the mask passed by value
/// [LINUX-COMPAT] x86_64 number
pub const SYS_SCHED_SETAFFINITY: u64 = 203;

/// [LINUX-COMPAT] x86_64 number
pub const SYS_SCHED_GETAFFINITY: u64 = 204;

/// `which` argument of set/getpriority selecting a single process
/// [LINUX-COMPAT]
pub const PRIO_PROCESS: i64 = 0;

/// Offset the raw getpriority syscall adds so results stay positive
/// [LINUX-COMPAT] returns 20 - nice, in [1, 40]
pub const PRIO_RAW_OFFSET: i64 = 20;

/// Clamp a niceness value into the valid range
#[inline(always)]
#[must_use]
pub const fn clamp_nice(value: i64) -> i32 {
    if value < NICE_MIN as i64 {
        NICE_MIN
    } else if value > NICE_MAX as i64 {
        NICE_MAX
    } else {
        value as i32
    }
}

/// Narrow a `Duration::as_*` count to u64, saturating instead of truncating
#[inline(always)]
#[must_use]
pub fn saturating_u64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

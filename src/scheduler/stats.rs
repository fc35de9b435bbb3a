/*!
 * Scheduling Statistics
 * Per-process schedstat records and lock-free accountant counters
 */

use super::cpuset::CpuSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-process scheduling statistics
///
/// Renders as the schedstat line
/// `<exec_time_ns> <wait_time_ns> <timeslice_count> [<cpu_list>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedStat {
    pub exec_time_ns: u64,
    pub wait_time_ns: u64,
    pub timeslice_count: u64,
    /// CPUs used since the current epoch started
    pub cpus: CpuSet,
}

impl fmt::Display for SchedStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.exec_time_ns, self.wait_time_ns, self.timeslice_count, self.cpus
        )
    }
}

/// Error parsing a schedstat line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed schedstat line '{0}'")]
pub struct ParseSchedStatError(pub String);

impl FromStr for SchedStat {
    type Err = ParseSchedStatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let err = || ParseSchedStatError(line.to_string());

        let mut fields = line.splitn(4, ' ');
        let mut number = || -> Result<u64, ParseSchedStatError> {
            fields.next().ok_or_else(err)?.parse().map_err(|_| err())
        };
        let exec_time_ns = number()?;
        let wait_time_ns = number()?;
        let timeslice_count = number()?;

        let list = fields
            .next()
            .and_then(|rest| rest.trim().strip_prefix('['))
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(err)?;
        let cpus = list.parse().map_err(|_| err())?;

        Ok(Self {
            exec_time_ns,
            wait_time_ns,
            timeslice_count,
            cpus,
        })
    }
}

/// Accountant-wide counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccountingStats {
    pub dispatches: u64,
    pub preemptions: u64,
    pub yields: u64,
    pub sleeps: u64,
    pub epoch_rollovers: u64,
}

/// Atomic accountant statistics for lock-free updates
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - All operations use relaxed ordering
#[repr(C, align(64))]
#[derive(Default)]
pub struct AtomicAccountingStats {
    dispatches: AtomicU64,
    preemptions: AtomicU64,
    yields: AtomicU64,
    sleeps: AtomicU64,
    epoch_rollovers: AtomicU64,
}

impl AtomicAccountingStats {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hot path - called on every dispatch
    #[inline(always)]
    pub fn inc_dispatches(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_preemptions(&self) {
        self.preemptions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_yields(&self) {
        self.yields.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_sleeps(&self) {
        self.sleeps.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_rollovers(&self) {
        self.epoch_rollovers.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of current counters
    ///
    /// # Note
    /// Counters may not be perfectly consistent with each other due to
    /// concurrent updates, but each individual value is accurate.
    pub fn snapshot(&self) -> AccountingStats {
        AccountingStats {
            dispatches: self.dispatches.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            yields: self.yields.load(Ordering::Relaxed),
            sleeps: self.sleeps.load(Ordering::Relaxed),
            epoch_rollovers: self.epoch_rollovers.load(Ordering::Relaxed),
        }
    }
}

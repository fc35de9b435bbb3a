/*!
 * Epoch Accountant
 * Scheduling-event hooks that keep per-process epoch accounting current
 */

use super::clock::Clock;
use super::stats::{AccountingStats, AtomicAccountingStats, SchedStat};
use crate::core::limits::saturating_u64;
use crate::core::types::{CpuId, Timestamp};
use crate::process::record::ProcessRecord;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Applies dispatch / tick / preempt / yield / sleep / wakeup events
///
/// Holds no per-process state of its own: every update lands on the
/// record's own `EpochAccount`, so events for different processes never
/// contend.
pub struct EpochAccountant {
    clock: Arc<dyn Clock>,
    epoch_length_ns: u64,
    stats: AtomicAccountingStats,
}

impl EpochAccountant {
    pub fn new(clock: Arc<dyn Clock>, epoch_length: Duration) -> Self {
        debug!(
            epoch_length_ms = saturating_u64(epoch_length.as_millis()),
            "Epoch accountant initialized"
        );
        Self {
            clock,
            epoch_length_ns: saturating_u64(epoch_length.as_nanos()),
            stats: AtomicAccountingStats::new(),
        }
    }

    #[inline]
    pub fn now(&self) -> Timestamp {
        self.clock.now_ns()
    }

    #[inline]
    pub fn epoch_length(&self) -> Duration {
        Duration::from_nanos(self.epoch_length_ns)
    }

    #[inline]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Process placed on `cpu`; returns whether its epoch rolled over
    pub fn on_dispatch(&self, record: &ProcessRecord, cpu: CpuId) -> bool {
        let now = self.now();
        let rolled = record.account().dispatch(cpu, now, self.epoch_length_ns);
        self.stats.inc_dispatches();

        if rolled {
            self.stats.inc_rollovers();
            debug!(pid = record.pid(), cpu, now_ns = now, "Epoch rolled over");
        } else {
            trace!(pid = record.pid(), cpu, "Dispatched");
        }
        rolled
    }

    /// Periodic charge of a running process
    pub fn on_tick(&self, record: &ProcessRecord) {
        record.account().charge(self.now());
    }

    /// Involuntary switch-out; the process goes back to the run queue
    pub fn on_preempt(&self, record: &ProcessRecord) {
        record.account().deschedule(self.now(), true);
        self.stats.inc_preemptions();
    }

    /// Voluntary switch-out; the process goes back to the run queue
    pub fn on_yield(&self, record: &ProcessRecord) {
        record.account().deschedule(self.now(), true);
        self.stats.inc_yields();
    }

    /// Process blocks; it stays off the run queue until woken
    pub fn on_sleep(&self, record: &ProcessRecord) {
        record.account().deschedule(self.now(), false);
        self.stats.inc_sleeps();
    }

    pub fn on_wakeup(&self, record: &ProcessRecord) {
        record.account().enqueue(self.now());
    }

    /// Process exited; close out whatever it was doing
    pub fn on_exit(&self, record: &ProcessRecord) {
        let now = self.now();
        record.account().deschedule(now, false);
        record.account().dequeue(now);
    }

    /// Non-blocking statistics read
    #[inline]
    pub fn snapshot(&self, record: &ProcessRecord) -> SchedStat {
        record.account().snapshot()
    }

    pub fn stats(&self) -> AccountingStats {
        self.stats.snapshot()
    }
}

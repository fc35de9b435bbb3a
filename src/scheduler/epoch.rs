/*!
 * Per-Process Epoch Accounting
 *
 * Execution/wait time, timeslice count, and the set of CPUs used during the
 * current epoch. Counters are lock-free atomics; the (epoch start, CPU set)
 * pair sits behind a seqlock so readers never block and never see a torn pair.
 */

use super::cpuset::CpuSet;
use super::stats::SchedStat;
use crate::core::types::{CpuId, Timestamp};
use parking_lot::Mutex;
use seqlock::SeqLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Current accounting epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochWindow {
    pub start_ns: Timestamp,
    pub cpus: CpuSet,
}

/// Dispatch-path timestamps, only touched by scheduling events
#[derive(Debug, Default)]
struct RunClock {
    queued_since: Option<Timestamp>,
    running_since: Option<Timestamp>,
    cpu: Option<CpuId>,
}

/// Scheduling accounting for one process
pub struct EpochAccount {
    exec_time_ns: AtomicU64,
    wait_time_ns: AtomicU64,
    timeslice_count: AtomicU64,
    window: SeqLock<EpochWindow>,
    run: Mutex<RunClock>,
}

impl EpochAccount {
    /// Fresh account for a process created (and queued) at `now`
    pub fn new(now: Timestamp) -> Self {
        Self {
            exec_time_ns: AtomicU64::new(0),
            wait_time_ns: AtomicU64::new(0),
            timeslice_count: AtomicU64::new(0),
            window: SeqLock::new(EpochWindow {
                start_ns: now,
                cpus: CpuSet::new(),
            }),
            run: Mutex::new(RunClock {
                queued_since: Some(now),
                ..RunClock::default()
            }),
        }
    }

    /// Process placed on `cpu` at `now`
    ///
    /// Rolls the epoch over first when `epoch_len_ns` has elapsed since its
    /// start. Returns whether a rollover happened.
    pub fn dispatch(&self, cpu: CpuId, now: Timestamp, epoch_len_ns: u64) -> bool {
        let mut run = self.run.lock();

        if let Some(since) = run.running_since.take() {
            self.add_exec(now.saturating_sub(since));
        }
        if let Some(since) = run.queued_since.take() {
            self.wait_time_ns
                .fetch_add(now.saturating_sub(since), Ordering::Relaxed);
        }
        run.running_since = Some(now);
        run.cpu = Some(cpu);
        self.timeslice_count.fetch_add(1, Ordering::Relaxed);

        let mut window = self.window.lock_write();
        let rolled = now.saturating_sub(window.start_ns) >= epoch_len_ns;
        if rolled {
            window.cpus.clear();
            window.start_ns = now;
        }
        window.cpus.insert(cpu);
        rolled
    }

    /// Charge execution time accrued so far; the process keeps running
    pub fn charge(&self, now: Timestamp) {
        let mut run = self.run.lock();
        if let Some(since) = run.running_since {
            self.add_exec(now.saturating_sub(since));
            run.running_since = Some(now.max(since));
        }
    }

    /// Process taken off its CPU; `requeue` starts wait-time accrual
    pub fn deschedule(&self, now: Timestamp, requeue: bool) {
        let mut run = self.run.lock();
        if let Some(since) = run.running_since.take() {
            self.add_exec(now.saturating_sub(since));
        }
        run.cpu = None;
        if requeue && run.queued_since.is_none() {
            run.queued_since = Some(now);
        }
    }

    /// Process became runnable without running (e.g. woke up)
    pub fn enqueue(&self, now: Timestamp) {
        let mut run = self.run.lock();
        if run.running_since.is_none() && run.queued_since.is_none() {
            run.queued_since = Some(now);
        }
    }

    /// Process stopped waiting without running (e.g. exited while queued)
    pub fn dequeue(&self, now: Timestamp) {
        let mut run = self.run.lock();
        if let Some(since) = run.queued_since.take() {
            self.wait_time_ns
                .fetch_add(now.saturating_sub(since), Ordering::Relaxed);
        }
    }

    /// CPU the process is currently running on
    pub fn current_cpu(&self) -> Option<CpuId> {
        self.run.lock().cpu
    }

    /// Current epoch window (lock-free)
    #[inline]
    pub fn window(&self) -> EpochWindow {
        self.window.read()
    }

    /// Point-in-time statistics (lock-free)
    ///
    /// Counters may be one event apart from each other under concurrent
    /// dispatch, but no individual value is ever torn.
    pub fn snapshot(&self) -> SchedStat {
        SchedStat {
            exec_time_ns: self.exec_time_ns.load(Ordering::Relaxed),
            wait_time_ns: self.wait_time_ns.load(Ordering::Relaxed),
            timeslice_count: self.timeslice_count.load(Ordering::Relaxed),
            cpus: self.window.read().cpus,
        }
    }

    #[inline(always)]
    fn add_exec(&self, delta: u64) {
        self.exec_time_ns.fetch_add(delta, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for EpochAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpochAccount")
            .field("stats", &self.snapshot())
            .field("epoch_start_ns", &self.window().start_ns)
            .finish()
    }
}

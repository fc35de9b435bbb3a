/*!
 * CPU Dispatcher
 *
 * Minimal FIFO driver over N simulated CPUs. Its only job is to turn ticks
 * into dispatch / preempt / yield / sleep / wakeup events for the epoch
 * accountant; selection is first-come-first-served filtered by affinity.
 */

use super::accountant::EpochAccountant;
use crate::core::limits::saturating_u64;
use crate::core::types::{CpuId, Pid, ProcessResult, Timestamp};
use crate::process::record::ProcessRecord;
use crate::process::table::ProcessTable;
use crate::process::types::ProcessState;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// What one CPU is doing
#[derive(Default)]
struct CpuSlot {
    current: Option<Arc<ProcessRecord>>,
    slice_start: Timestamp,
}

/// Multi-CPU dispatch driver
pub struct Dispatcher {
    table: Arc<ProcessTable>,
    accountant: Arc<EpochAccountant>,
    run_queue: Mutex<VecDeque<Pid>>,
    cpus: Vec<Mutex<CpuSlot>>,
    quantum_ns: u64,
}

impl Dispatcher {
    pub fn new(table: Arc<ProcessTable>, accountant: Arc<EpochAccountant>, quantum: Duration) -> Self {
        let cpus = (0..table.num_cpus())
            .map(|_| Mutex::new(CpuSlot::default()))
            .collect();

        debug!(
            num_cpus = table.num_cpus(),
            quantum_us = saturating_u64(quantum.as_micros()),
            "Dispatcher initialized"
        );

        Self {
            table,
            accountant,
            run_queue: Mutex::new(VecDeque::new()),
            cpus,
            quantum_ns: saturating_u64(quantum.as_nanos()),
        }
    }

    #[inline]
    pub fn num_cpus(&self) -> usize {
        self.cpus.len()
    }

    #[inline]
    pub fn quantum(&self) -> Duration {
        Duration::from_nanos(self.quantum_ns)
    }

    /// Make a live process runnable and queue it
    pub fn enqueue(&self, pid: Pid) -> ProcessResult<()> {
        let record = self.table.live(pid)?;
        if record.state() == ProcessState::Running {
            return Ok(());
        }
        record.set_state(ProcessState::Runnable);
        self.accountant.on_wakeup(&record);

        let mut queue = self.run_queue.lock();
        if !queue.contains(&pid) {
            queue.push_back(pid);
        }
        Ok(())
    }

    /// One scheduling round across every CPU
    pub fn tick(&self) {
        for (idx, slot) in self.cpus.iter().enumerate() {
            let cpu = idx as CpuId;
            let mut slot = slot.lock();

            if let Some(current) = slot.current.clone() {
                if !current.is_alive() {
                    slot.current = None;
                } else {
                    self.accountant.on_tick(&current);

                    let now = self.accountant.now();
                    let migrated = !current.affinity().contains(cpu);
                    let expired = now.saturating_sub(slot.slice_start) >= self.quantum_ns;

                    if migrated {
                        self.preempt(&mut slot, cpu);
                    } else if expired {
                        if let Some(next) = self.pop_candidate(cpu) {
                            self.preempt(&mut slot, cpu);
                            self.dispatch(&mut slot, next, cpu);
                        }
                    }
                }
            }

            if slot.current.is_none() {
                if let Some(next) = self.pop_candidate(cpu) {
                    self.dispatch(&mut slot, next, cpu);
                }
            }
        }
    }

    /// Voluntary yield of a running process
    pub fn yield_now(&self, pid: Pid) -> bool {
        let Some((mut slot, _cpu)) = self.slot_running(pid) else {
            return false;
        };
        let Some(record) = slot.current.take() else {
            return false;
        };

        record.set_state(ProcessState::Runnable);
        self.accountant.on_yield(&record);
        self.run_queue.lock().push_back(pid);
        trace!(pid, "Yielded");
        true
    }

    /// Block a process until `wake`
    pub fn sleep(&self, pid: Pid) -> ProcessResult<()> {
        let record = self.table.live(pid)?;

        if let Some((mut slot, _)) = self.slot_running(pid) {
            slot.current = None;
            record.set_state(ProcessState::Sleeping);
            self.accountant.on_sleep(&record);
        } else {
            self.run_queue.lock().retain(|p| *p != pid);
            record.set_state(ProcessState::Sleeping);
            record.account().dequeue(self.accountant.now());
        }
        trace!(pid, "Sleeping");
        Ok(())
    }

    /// Wake a sleeping process
    pub fn wake(&self, pid: Pid) -> ProcessResult<()> {
        let record = self.table.live(pid)?;
        if record.state() != ProcessState::Sleeping {
            return Ok(());
        }
        self.enqueue(pid)
    }

    /// Drop every trace of an exited process
    pub fn remove(&self, record: &ProcessRecord) {
        let pid = record.pid();
        if let Some((mut slot, _)) = self.slot_running(pid) {
            slot.current = None;
        }
        self.run_queue.lock().retain(|p| *p != pid);
        self.accountant.on_exit(record);
    }

    /// Pid currently on `cpu`
    pub fn running_on(&self, cpu: CpuId) -> Option<Pid> {
        self.cpus
            .get(cpu as usize)
            .and_then(|slot| slot.lock().current.as_ref().map(|r| r.pid()))
    }

    /// Queued pids in dispatch order
    pub fn queued(&self) -> Vec<Pid> {
        self.run_queue.lock().iter().copied().collect()
    }

    fn dispatch(&self, slot: &mut CpuSlot, record: Arc<ProcessRecord>, cpu: CpuId) {
        record.set_state(ProcessState::Running);
        self.accountant.on_dispatch(&record, cpu);
        slot.slice_start = self.accountant.now();
        slot.current = Some(record);
    }

    fn preempt(&self, slot: &mut CpuSlot, cpu: CpuId) {
        if let Some(record) = slot.current.take() {
            record.set_state(ProcessState::Runnable);
            self.accountant.on_preempt(&record);
            self.run_queue.lock().push_back(record.pid());
            trace!(pid = record.pid(), cpu, "Preempted");
        }
    }

    /// First queued live process allowed on `cpu`; dead entries are dropped
    fn pop_candidate(&self, cpu: CpuId) -> Option<Arc<ProcessRecord>> {
        let mut queue = self.run_queue.lock();
        queue.retain(|pid| self.table.live(*pid).is_ok());

        let pos = queue.iter().position(|pid| {
            self.table
                .get(*pid)
                .is_some_and(|r| r.state() == ProcessState::Runnable && r.affinity().contains(cpu))
        })?;
        let pid = queue.remove(pos)?;
        self.table.get(pid)
    }

    fn slot_running(&self, pid: Pid) -> Option<(parking_lot::MutexGuard<'_, CpuSlot>, CpuId)> {
        self.cpus.iter().enumerate().find_map(|(idx, slot)| {
            let guard = slot.lock();
            if guard.current.as_ref().is_some_and(|r| r.pid() == pid) {
                Some((guard, idx as CpuId))
            } else {
                None
            }
        })
    }
}

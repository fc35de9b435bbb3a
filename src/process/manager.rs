/*!
 * Process Management
 * Ties the process table, epoch accountant and dispatcher together
 */

use super::ancestry::resolve_ancestor;
use super::manager_builder::ProcessManagerBuilder;
use super::nice::{propagate_nice, Propagation};
use super::table::ProcessTable;
use super::traits::{ProcessLifecycle, ProcessLineage, SchedulingControl};
use super::types::ProcessInfo;
use crate::core::config::KernelConfig;
use crate::core::errors::ProcessError;
use crate::core::types::{Nice, Pid, ProcessResult, RawPid};
use crate::monitoring::span_operation;
use crate::scheduler::accountant::EpochAccountant;
use crate::scheduler::cpuset::CpuSet;
use crate::scheduler::dispatcher::Dispatcher;
use crate::scheduler::stats::{AccountingStats, SchedStat};
use crate::scheduler::task::DispatcherTask;
use std::sync::Arc;
use tracing::info;

/// Facade over the process subsystem
///
/// Cheap to clone; every clone shares the same table and dispatcher.
#[derive(Clone)]
pub struct ProcessManager {
    pub(super) table: Arc<ProcessTable>,
    pub(super) accountant: Arc<EpochAccountant>,
    pub(super) dispatcher: Arc<Dispatcher>,
    pub(super) config: KernelConfig,
}

impl ProcessManager {
    pub fn builder() -> ProcessManagerBuilder {
        ProcessManagerBuilder::new()
    }

    #[inline]
    pub fn table(&self) -> &Arc<ProcessTable> {
        &self.table
    }

    #[inline]
    pub fn accountant(&self) -> &Arc<EpochAccountant> {
        &self.accountant
    }

    #[inline]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    #[inline]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Run one dispatcher round
    pub fn tick(&self) {
        self.dispatcher.tick();
    }

    /// Start ticking in the background; needs a tokio runtime
    pub fn spawn_dispatcher(&self) -> DispatcherTask {
        DispatcherTask::spawn(Arc::clone(&self.dispatcher))
    }

    pub fn yield_now(&self, pid: Pid) -> bool {
        self.dispatcher.yield_now(pid)
    }

    pub fn sleep(&self, pid: Pid) -> ProcessResult<()> {
        self.dispatcher.sleep(pid)
    }

    pub fn wake(&self, pid: Pid) -> ProcessResult<()> {
        self.dispatcher.wake(pid)
    }

    /// Reap every zombie that was handed to init
    pub fn reap_orphans(&self) -> usize {
        self.table.reap_orphans()
    }

    pub fn accounting_stats(&self) -> AccountingStats {
        self.accountant.stats()
    }
}

impl ProcessLifecycle for ProcessManager {
    fn fork(&self, parent: Pid, name: String) -> ProcessResult<Pid> {
        let child = self.table.fork(parent, name, self.accountant.now())?;
        self.dispatcher.enqueue(child.pid())?;
        Ok(child.pid())
    }

    fn exit(&self, pid: Pid) -> ProcessResult<()> {
        let span = span_operation("exit");
        let _guard = span.enter();

        let record = self.table.exit(pid)?;
        self.dispatcher.remove(&record);
        span.record_result(true);
        Ok(())
    }

    fn reap(&self, parent: Pid, child: Pid) -> ProcessResult<()> {
        self.table.reap(parent, child)
    }

    fn exists(&self, pid: Pid) -> bool {
        self.table.live(pid).is_ok()
    }

    fn get_process(&self, pid: Pid) -> Option<ProcessInfo> {
        self.table.get(pid).map(|r| r.info())
    }

    fn list_processes(&self) -> Vec<ProcessInfo> {
        self.table.list()
    }
}

impl ProcessLineage for ProcessManager {
    fn ancestor_pid(&self, caller: Pid, pid: RawPid, n: u32) -> ProcessResult<Pid> {
        resolve_ancestor(&self.table, caller, pid, n)
    }

    fn propagate_nice(&self, caller: Pid, increment: i32) -> ProcessResult<Propagation> {
        let span = span_operation("propagate_nice");
        let _guard = span.enter();

        match propagate_nice(&self.table, caller, increment) {
            Ok(out) => {
                span.record_items_processed(out.descendants_visited);
                span.record_result(true);
                Ok(out)
            }
            Err(e) => {
                span.record_error(&e.to_string());
                Err(e)
            }
        }
    }
}

impl SchedulingControl for ProcessManager {
    fn set_niceness(&self, pid: Pid, value: i64) -> ProcessResult<Nice> {
        self.table.set_niceness(pid, value)
    }

    fn niceness(&self, pid: Pid) -> ProcessResult<Nice> {
        self.table.niceness(pid)
    }

    fn set_affinity(&self, pid: Pid, cpus: CpuSet) -> ProcessResult<()> {
        self.table.set_affinity(pid, cpus)
    }

    fn affinity(&self, pid: Pid) -> ProcessResult<CpuSet> {
        self.table.affinity(pid)
    }

    /// Readable until the record is reaped
    fn schedstat(&self, pid: Pid) -> ProcessResult<SchedStat> {
        self.table
            .get(pid)
            .map(|record| self.accountant.snapshot(&record))
            .ok_or_else(|| ProcessError::no_such_process(pid))
    }
}

pub(super) fn log_boot(manager: &ProcessManager) {
    info!(
        num_cpus = manager.config.num_cpus,
        epoch_ms = manager.config.epoch_length_ms,
        quantum_us = manager.config.quantum_us,
        "Process manager initialized"
    );
}

/*!
 * Process Table
 *
 * Authoritative store of process records plus the fork / exit / reap hooks
 * that keep parent and children links consistent.
 */

use super::record::ProcessRecord;
use super::types::ProcessInfo;
use crate::core::errors::ProcessError;
use crate::core::limits::{INIT_PID, PID_MAX};
use crate::core::types::{Nice, Pid, ProcessResult, Timestamp};
use crate::scheduler::cpuset::CpuSet;
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Process record store
///
/// # Performance
/// - Sharded map: lookups of unrelated pids never contend
/// - No table-wide lock is held while walking the tree
pub struct ProcessTable {
    records: DashMap<Pid, Arc<ProcessRecord>, RandomState>,
    next_pid: AtomicU32,
    num_cpus: usize,
    init: Arc<ProcessRecord>,
}

impl ProcessTable {
    /// Boot a table containing only init
    pub fn boot(num_cpus: usize, now: Timestamp) -> Self {
        let init = ProcessRecord::new_root(INIT_PID, "init".into(), CpuSet::first_n(num_cpus), now);
        let records = DashMap::with_hasher(RandomState::new());
        records.insert(INIT_PID, Arc::clone(&init));

        info!(num_cpus, "Process table booted with init (PID {})", INIT_PID);

        Self {
            records,
            next_pid: AtomicU32::new(INIT_PID + 1),
            num_cpus,
            init,
        }
    }

    #[inline]
    pub fn init(&self) -> &Arc<ProcessRecord> {
        &self.init
    }

    #[inline]
    pub fn num_cpus(&self) -> usize {
        self.num_cpus
    }

    /// Record for `pid`, live or zombie
    pub fn get(&self, pid: Pid) -> Option<Arc<ProcessRecord>> {
        self.records.get(&pid).map(|r| Arc::clone(r.value()))
    }

    /// Record for `pid` if it names a live process
    pub fn live(&self, pid: Pid) -> ProcessResult<Arc<ProcessRecord>> {
        self.get(pid)
            .filter(|r| r.is_alive())
            .ok_or_else(|| ProcessError::no_such_process(pid))
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.records.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn list(&self) -> Vec<ProcessInfo> {
        let mut infos: Vec<ProcessInfo> = self.records.iter().map(|r| r.value().info()).collect();
        infos.sort_by_key(|info| info.pid);
        infos
    }

    // =========================================================================
    // Lifecycle hooks
    // =========================================================================

    /// Create a child of `parent`
    pub fn fork(&self, parent: Pid, name: String, now: Timestamp) -> ProcessResult<Arc<ProcessRecord>> {
        let parent_rec = self.live(parent)?;

        for _ in 0..PID_MAX {
            let pid = self.allocate_pid();
            let child = match self.records.entry(pid) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let child = ProcessRecord::new_child(pid, name, &parent_rec, now);
                    slot.insert(Arc::clone(&child));
                    child
                }
            };

            if !parent_rec.link_child(Arc::clone(&child)) {
                // Parent exited between lookup and link; the record was briefly
                // visible, so it leaves as a zombie rather than a live orphan
                let _ = child.mark_zombie();
                self.records.remove_if(&pid, |_, r| Arc::ptr_eq(r, &child));
                return Err(ProcessError::no_such_process(parent));
            }

            debug!(
                pid,
                ppid = parent,
                niceness = child.niceness(),
                "Forked process '{}'",
                child.name()
            );
            return Ok(child);
        }

        Err(ProcessError::LimitReached(format!(
            "no free PID below {}",
            PID_MAX
        )))
    }

    /// Turn `pid` into a zombie and hand its children to init
    pub fn exit(&self, pid: Pid) -> ProcessResult<Arc<ProcessRecord>> {
        if pid == INIT_PID {
            return Err(ProcessError::invalid_argument("init cannot exit"));
        }
        let record = self.live(pid)?;
        let orphans = record
            .mark_zombie()
            .ok_or_else(|| ProcessError::no_such_process(pid))?;

        // One record lock at a time. Unlinking first claims the orphan
        // against a concurrent reap of the same zombie child.
        let mut reparented = 0;
        for orphan in &orphans {
            if record.unlink_child(orphan.pid()).is_none() {
                continue;
            }
            orphan.set_parent(&self.init);
            if !self.init.link_child(Arc::clone(orphan)) {
                debug!(pid = orphan.pid(), "Init refused orphan");
            }
            reparented += 1;
        }

        debug!(pid, reparented, "Process exited");
        Ok(record)
    }

    /// Remove zombie `child` of `parent` from the table
    ///
    /// Only a live parent reaps. Unlinks from the parent's children before
    /// dropping the table entry, so no traversal can reach a reaped record,
    /// and only drops the entry if it still holds this same record.
    pub fn reap(&self, parent: Pid, child: Pid) -> ProcessResult<()> {
        let parent_rec = self.live(parent)?;
        let child_rec = parent_rec
            .child(child)
            .filter(|c| !c.is_alive())
            .ok_or_else(|| ProcessError::no_such_process(child))?;

        // Lost to the parent's own exit handing the child to init
        if parent_rec.unlink_child(child_rec.pid()).is_none() {
            return Err(ProcessError::no_such_process(child));
        }
        self.records
            .remove_if(&child, |_, r| Arc::ptr_eq(r, &child_rec));

        debug!(pid = child, ppid = parent, "Reaped process");
        Ok(())
    }

    /// Reap every zombie currently linked under init
    pub fn reap_orphans(&self) -> usize {
        let zombies: Vec<Pid> = self
            .init
            .child_pids()
            .into_iter()
            .filter(|pid| self.get(*pid).is_some_and(|r| !r.is_alive()))
            .collect();

        zombies
            .iter()
            .filter(|pid| self.reap(INIT_PID, **pid).is_ok())
            .count()
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// setpriority equivalent; clamps to [-20, 19]
    pub fn set_niceness(&self, pid: Pid, value: i64) -> ProcessResult<Nice> {
        Ok(self.live(pid)?.set_niceness(value))
    }

    /// getpriority equivalent
    pub fn niceness(&self, pid: Pid) -> ProcessResult<Nice> {
        Ok(self.live(pid)?.niceness())
    }

    /// sched_setaffinity equivalent
    pub fn set_affinity(&self, pid: Pid, cpus: CpuSet) -> ProcessResult<()> {
        let record = self.live(pid)?;
        if cpus.is_empty() {
            return Err(ProcessError::invalid_argument("empty CPU set"));
        }
        if cpus.max().is_some_and(|cpu| cpu as usize >= self.num_cpus) {
            return Err(ProcessError::invalid_argument(format!(
                "CPU set {} exceeds {} configured CPUs",
                cpus, self.num_cpus
            )));
        }
        record.set_affinity(cpus);
        debug!(pid, affinity = %cpus, "Affinity updated");
        Ok(())
    }

    pub fn affinity(&self, pid: Pid) -> ProcessResult<CpuSet> {
        Ok(self.live(pid)?.affinity())
    }

    /// Next candidate pid, wrapping to 2 after PID_MAX
    fn allocate_pid(&self) -> Pid {
        let mut pid = self.next_pid.fetch_add(1, Ordering::Relaxed);
        if pid > PID_MAX || pid <= INIT_PID {
            // Only one thread wins the reset; the rest just retry with a fresh value
            let _ = self.next_pid.compare_exchange(
                pid + 1,
                INIT_PID + 2,
                Ordering::Relaxed,
                Ordering::Relaxed,
            );
            pid = INIT_PID + 1;
        }
        pid
    }
}

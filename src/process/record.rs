/*!
 * Process Records
 *
 * One record per live or zombie process. Each record is an independently
 * lockable unit: links (parent + children) behind one RwLock, niceness and
 * state as atomics, accounting inside `EpochAccount`.
 */

use super::types::{ProcessInfo, ProcessState};
use crate::core::limits::{clamp_nice, NICE_DEFAULT};
use crate::core::types::{Nice, Pid, Timestamp};
use crate::scheduler::cpuset::CpuSet;
use crate::scheduler::epoch::EpochAccount;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

/// Tree linkage of a record
struct Links {
    /// Never keeps the parent alive
    parent: Weak<ProcessRecord>,
    children: BTreeMap<Pid, Arc<ProcessRecord>>,
}

/// Per-process metadata
pub struct ProcessRecord {
    pid: Pid,
    name: String,
    niceness: AtomicI32,
    state: AtomicU8,
    links: RwLock<Links>,
    affinity: RwLock<CpuSet>,
    account: EpochAccount,
    created_at: Timestamp,
}

impl ProcessRecord {
    /// Record without a parent (init)
    pub fn new_root(pid: Pid, name: String, affinity: CpuSet, now: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            pid,
            name,
            niceness: AtomicI32::new(NICE_DEFAULT),
            state: AtomicU8::new(ProcessState::Runnable as u8),
            links: RwLock::new(Links {
                parent: Weak::new(),
                children: BTreeMap::new(),
            }),
            affinity: RwLock::new(affinity),
            account: EpochAccount::new(now),
            created_at: now,
        })
    }

    /// Record forked from `parent`: inherits niceness and affinity, fresh accounting
    ///
    /// Not linked into the parent's children; see `link_child`.
    pub fn new_child(pid: Pid, name: String, parent: &Arc<Self>, now: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            pid,
            name,
            niceness: AtomicI32::new(parent.niceness()),
            state: AtomicU8::new(ProcessState::Runnable as u8),
            links: RwLock::new(Links {
                parent: Arc::downgrade(parent),
                children: BTreeMap::new(),
            }),
            affinity: RwLock::new(parent.affinity()),
            account: EpochAccount::new(now),
            created_at: now,
        })
    }

    #[inline(always)]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    #[inline(always)]
    pub fn account(&self) -> &EpochAccount {
        &self.account
    }

    // =========================================================================
    // Niceness
    // =========================================================================

    #[inline(always)]
    pub fn niceness(&self) -> Nice {
        self.niceness.load(Ordering::Acquire)
    }

    /// Store a niceness value, clamped to [-20, 19]
    pub fn set_niceness(&self, value: i64) -> Nice {
        let clamped = clamp_nice(value);
        self.niceness.store(clamped, Ordering::Release);
        clamped
    }

    /// Add `delta` and clamp in a single atomic step
    ///
    /// Concurrent adders never observe or publish an out-of-range value.
    pub fn add_niceness(&self, delta: i32) -> Nice {
        let mut next = NICE_DEFAULT;
        // The closure always returns Some, so fetch_update cannot fail
        let _ = self
            .niceness
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                next = clamp_nice(current as i64 + delta as i64);
                Some(next)
            });
        next
    }

    // =========================================================================
    // State
    // =========================================================================

    #[inline(always)]
    pub fn state(&self) -> ProcessState {
        ProcessState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline(always)]
    pub fn is_alive(&self) -> bool {
        self.state().is_alive()
    }

    /// Move between live states; refuses to resurrect a zombie
    pub fn set_state(&self, to: ProcessState) -> bool {
        if !to.is_alive() {
            return false;
        }
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                ProcessState::from_u8(raw).is_alive().then_some(to as u8)
            })
            .is_ok()
    }

    /// Turn into a zombie, returning the children linked at that moment
    ///
    /// Happens under the link lock so a concurrent fork cannot attach a new
    /// child after the snapshot. `None` if already a zombie.
    pub(crate) fn mark_zombie(&self) -> Option<Vec<Arc<ProcessRecord>>> {
        let links = self.links.write();
        if !self.is_alive() {
            return None;
        }
        self.state
            .store(ProcessState::Zombie as u8, Ordering::Release);
        Some(links.children.values().cloned().collect())
    }

    // =========================================================================
    // Links
    // =========================================================================

    /// Parent record, if it still exists
    pub fn parent(&self) -> Option<Arc<ProcessRecord>> {
        self.links.read().parent.upgrade()
    }

    pub fn ppid(&self) -> Option<Pid> {
        self.parent().map(|p| p.pid())
    }

    /// Snapshot of the live children, taken under this record's lock only
    pub fn live_children(&self) -> Vec<Arc<ProcessRecord>> {
        self.links
            .read()
            .children
            .values()
            .filter(|child| child.is_alive())
            .cloned()
            .collect()
    }

    /// Snapshot of every linked child, zombies included
    pub fn children(&self) -> Vec<Arc<ProcessRecord>> {
        self.links.read().children.values().cloned().collect()
    }

    /// Pids of every linked child, zombies included
    pub fn child_pids(&self) -> Vec<Pid> {
        self.links.read().children.keys().copied().collect()
    }

    pub(crate) fn child(&self, pid: Pid) -> Option<Arc<ProcessRecord>> {
        self.links.read().children.get(&pid).cloned()
    }

    /// Link `child`; fails once this record is a zombie
    pub(crate) fn link_child(&self, child: Arc<ProcessRecord>) -> bool {
        let mut links = self.links.write();
        if !self.is_alive() {
            return false;
        }
        links.children.insert(child.pid(), child);
        true
    }

    pub(crate) fn unlink_child(&self, pid: Pid) -> Option<Arc<ProcessRecord>> {
        self.links.write().children.remove(&pid)
    }

    pub(crate) fn set_parent(&self, parent: &Arc<ProcessRecord>) {
        self.links.write().parent = Arc::downgrade(parent);
    }

    // =========================================================================
    // Affinity
    // =========================================================================

    #[inline]
    pub fn affinity(&self) -> CpuSet {
        *self.affinity.read()
    }

    pub(crate) fn set_affinity(&self, cpus: CpuSet) {
        *self.affinity.write() = cpus;
    }

    /// Point-in-time metadata
    pub fn info(&self) -> ProcessInfo {
        ProcessInfo {
            pid: self.pid,
            ppid: self.ppid(),
            name: self.name.clone(),
            state: self.state(),
            niceness: self.niceness(),
            affinity: self.affinity(),
            children: self.child_pids(),
        }
    }
}

impl std::fmt::Debug for ProcessRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRecord")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("state", &self.state())
            .field("niceness", &self.niceness())
            .finish_non_exhaustive()
    }
}

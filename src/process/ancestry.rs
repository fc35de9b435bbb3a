/*!
 * Ancestry Resolution
 * Walks parent links N generations up from a process
 */

use super::record::ProcessRecord;
use super::table::ProcessTable;
use crate::core::errors::ProcessError;
use crate::core::types::{Pid, ProcessResult, RawPid};
use std::sync::Arc;
use std::thread;
use tracing::trace;

/// Spins between parent re-reads before yielding the thread
const SPINS_PER_YIELD: u32 = 10;

/// Resolve the `n`th ancestor of `pid` as seen by `caller`
///
/// `pid == 0` selects the caller and `n == 0` returns the process itself.
/// Each step holds only the visited record's link lock, so fork/exit
/// elsewhere in the tree proceed concurrently.
pub fn resolve_ancestor(
    table: &ProcessTable,
    caller: Pid,
    pid: RawPid,
    n: u32,
) -> ProcessResult<Pid> {
    let start = match pid {
        0 => caller,
        p if p < 0 => return Err(ProcessError::no_such_process(p)),
        p => p as Pid,
    };

    let mut current = table.live(start)?;
    for depth in 1..=n {
        let parent = live_parent(&current)
            .ok_or(ProcessError::NoSuchAncestor { pid: start, depth: n })?;
        trace!(pid = start, depth, ancestor = parent.pid(), "Ancestry step");
        current = parent;
    }

    Ok(current.pid())
}

/// Live parent of `record`
///
/// A live process whose parent is a zombie is in the middle of being handed
/// to init by the parent's exit; the link is re-read until the handoff lands.
/// `None` at the root, or once `record` itself is no longer live.
fn live_parent(record: &ProcessRecord) -> Option<Arc<ProcessRecord>> {
    let mut spins = 0u32;
    loop {
        let parent = record.parent()?;
        if parent.is_alive() {
            return Some(parent);
        }
        if !record.is_alive() {
            return None;
        }

        spins = spins.wrapping_add(1);
        if spins % SPINS_PER_YIELD == 0 {
            thread::yield_now();
        } else {
            std::hint::spin_loop();
        }
    }
}

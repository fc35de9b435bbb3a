/*!
 * Niceness Propagation
 *
 * Raises the caller's niceness and pushes a halving increment down its live
 * descendants. Decay is keyed on the increment handed down, not on the
 * clamped change a node actually absorbed.
 */

use super::record::ProcessRecord;
use super::table::ProcessTable;
use crate::core::errors::ProcessError;
use crate::core::types::{Nice, Pid, ProcessResult};
use std::sync::Arc;
use tracing::{debug, trace};

/// Outcome of one propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Propagation {
    /// Caller's resulting niceness
    pub niceness: Nice,
    /// Descendants that received a non-zero increment
    pub descendants_visited: usize,
    /// Dead children skipped along the way
    pub skipped: usize,
}

/// Increment handed to the next generation
#[inline(always)]
pub const fn decay(increment: i32) -> i32 {
    increment / 2
}

/// Propagate `increment` from `caller` down its live subtree
///
/// Rejects `increment <= 0` before touching anything. Once validation
/// passes, dead children are skipped and never abort the walk.
pub fn propagate_nice(
    table: &ProcessTable,
    caller: Pid,
    increment: i32,
) -> ProcessResult<Propagation> {
    if increment <= 0 {
        return Err(ProcessError::invalid_argument(format!(
            "niceness increment must be positive, got {}",
            increment
        )));
    }

    let root = table.live(caller)?;
    let niceness = root.add_niceness(increment);

    let mut visited = 0;
    let mut skipped = 0;
    let mut work: Vec<(Arc<ProcessRecord>, i32)> = Vec::new();
    push_children(&root, decay(increment), &mut work);

    while let Some((record, inc)) = work.pop() {
        if !record.is_alive() {
            skipped += 1;
            trace!(pid = record.pid(), "Skipping dead child");
            continue;
        }

        let now = record.add_niceness(inc);
        visited += 1;
        trace!(pid = record.pid(), increment = inc, niceness = now, "Niceness propagated");

        push_children(&record, decay(inc), &mut work);
    }

    debug!(
        pid = caller,
        increment,
        niceness,
        descendants = visited,
        skipped,
        "propagate_nice complete"
    );

    Ok(Propagation {
        niceness,
        descendants_visited: visited,
        skipped,
    })
}

/// Queue the children of `record`, unless the decayed increment is zero
///
/// The child list is snapshot under `record`'s lock, which is released
/// before any child is visited. Liveness is checked at visit time.
fn push_children(record: &ProcessRecord, increment: i32, work: &mut Vec<(Arc<ProcessRecord>, i32)>) {
    if increment == 0 {
        return;
    }
    work.extend(
        record
            .children()
            .into_iter()
            .map(|child| (child, increment)),
    );
}

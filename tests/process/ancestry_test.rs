/*!
 * Ancestry Tests
 * ancestor_pid over multi-generation trees, exits and re-parenting
 */

use lineage_kernel::core::limits::INIT_PID;
use lineage_kernel::{
    Pid, ProcessError, ProcessLifecycle, ProcessLineage, ProcessManager,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn manager() -> ProcessManager {
    ProcessManager::builder().with_cpus(2).build().unwrap()
}

/// init -> p1 -> p2 -> ... (depth processes)
fn chain(pm: &ProcessManager, depth: usize) -> Vec<Pid> {
    let mut pids: Vec<Pid> = Vec::with_capacity(depth);
    for i in 0..depth {
        let parent = pids.last().copied().unwrap_or(INIT_PID);
        pids.push(pm.fork(parent, format!("p{}", i + 1)).unwrap());
    }
    pids
}

#[test]
fn test_grandchild_walks_to_init() {
    let pm = manager();
    let pids = chain(&pm, 3);
    let (p1, p2, p3) = (pids[0], pids[1], pids[2]);

    assert_eq!(pm.ancestor_pid(p3, 0, 0).unwrap(), p3);
    assert_eq!(pm.ancestor_pid(p3, 0, 1).unwrap(), p2);
    assert_eq!(pm.ancestor_pid(p3, 0, 2).unwrap(), p1);
    assert_eq!(pm.ancestor_pid(p3, 0, 3).unwrap(), INIT_PID);
    assert_eq!(
        pm.ancestor_pid(p3, 0, 4).unwrap_err(),
        ProcessError::NoSuchAncestor { pid: p3, depth: 4 }
    );
    assert!(matches!(
        pm.ancestor_pid(p3, 0, 999),
        Err(ProcessError::NoSuchAncestor { .. })
    ));
}

#[test]
fn test_explicit_pid_from_other_caller() {
    let pm = manager();
    let pids = chain(&pm, 2);
    assert_eq!(pm.ancestor_pid(INIT_PID, pids[1] as i32, 1).unwrap(), pids[0]);
}

#[test]
fn test_negative_and_missing_pids() {
    let pm = manager();
    assert_eq!(
        pm.ancestor_pid(INIT_PID, -5, 0).unwrap_err(),
        ProcessError::NoSuchProcess(-5)
    );
    assert_eq!(
        pm.ancestor_pid(INIT_PID, 31_000, 0).unwrap_err(),
        ProcessError::NoSuchProcess(31_000)
    );
}

#[test]
fn test_zombie_is_not_a_process() {
    let pm = manager();
    let pids = chain(&pm, 2);
    pm.exit(pids[1]).unwrap();

    assert!(matches!(
        pm.ancestor_pid(INIT_PID, pids[1] as i32, 0),
        Err(ProcessError::NoSuchProcess(_))
    ));
}

#[test]
fn test_orphan_sees_init_after_parent_exit() {
    let pm = manager();
    let pids = chain(&pm, 3);
    pm.exit(pids[1]).unwrap();

    assert_eq!(pm.ancestor_pid(pids[2], 0, 1).unwrap(), INIT_PID);
    assert!(pm.ancestor_pid(pids[2], 0, 2).is_err());
}

proptest! {
    #[test]
    fn prop_kth_ancestor_of_chain(depth in 1usize..12, k in 0u32..16) {
        let pm = manager();
        let pids = chain(&pm, depth);
        let leaf = *pids.last().unwrap();

        let result = pm.ancestor_pid(leaf, 0, k);
        let k = k as usize;
        if k < depth {
            prop_assert_eq!(result.unwrap(), pids[depth - 1 - k]);
        } else if k == depth {
            prop_assert_eq!(result.unwrap(), INIT_PID);
        } else {
            let is_no_such_ancestor = matches!(result, Err(ProcessError::NoSuchAncestor { .. }));
            prop_assert!(is_no_such_ancestor);
        }
    }
}

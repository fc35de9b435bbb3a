/*!
 * Niceness Propagation Tests
 * Decay, clamping and dead-child handling across process trees
 */

use lineage_kernel::core::limits::INIT_PID;
use lineage_kernel::{
    Pid, ProcessError, ProcessLifecycle, ProcessLineage, ProcessManager, SchedulingControl,
};
use pretty_assertions::assert_eq;

fn manager() -> ProcessManager {
    ProcessManager::builder().with_cpus(2).build().unwrap()
}

fn fork(pm: &ProcessManager, parent: Pid, name: &str) -> Pid {
    pm.fork(parent, name.to_string()).unwrap()
}

#[test]
fn test_positive_increment_with_live_children() {
    let pm = manager();
    let parent = fork(&pm, INIT_PID, "parent");
    let child = fork(&pm, parent, "child");
    let grandchild = fork(&pm, child, "grandchild");

    let out = pm.propagate_nice(parent, 4).unwrap();
    assert_eq!(out.niceness, 4);
    assert_eq!(pm.niceness(parent).unwrap(), 4);
    assert_eq!(pm.niceness(child).unwrap(), 2);
    assert_eq!(pm.niceness(grandchild).unwrap(), 1);
}

#[test]
fn test_zero_increment_changes_nothing() {
    let pm = manager();
    let parent = fork(&pm, INIT_PID, "parent");
    pm.set_niceness(parent, 10).unwrap();

    assert!(matches!(
        pm.propagate_nice(parent, 0),
        Err(ProcessError::InvalidArgument(_))
    ));
    assert_eq!(pm.niceness(parent).unwrap(), 10);
}

#[test]
fn test_negative_increment_rejected() {
    let pm = manager();
    let parent = fork(&pm, INIT_PID, "parent");
    assert!(matches!(
        pm.propagate_nice(parent, -5),
        Err(ProcessError::InvalidArgument(_))
    ));
    assert_eq!(pm.niceness(parent).unwrap(), 0);
}

#[test]
fn test_maximum_clamping() {
    let pm = manager();
    let parent = fork(&pm, INIT_PID, "parent");
    let child = fork(&pm, parent, "child");
    pm.set_niceness(parent, 18).unwrap();
    pm.set_niceness(child, 18).unwrap();

    assert_eq!(pm.propagate_nice(parent, 3).unwrap().niceness, 19);
    assert_eq!(pm.niceness(child).unwrap(), 19);
}

#[test]
fn test_minimum_start() {
    let pm = manager();
    let parent = fork(&pm, INIT_PID, "parent");
    pm.set_niceness(parent, -20).unwrap();
    assert_eq!(pm.propagate_nice(parent, 5).unwrap().niceness, -15);
}

#[test]
fn test_dead_child_is_skipped() {
    let pm = manager();
    let parent = fork(&pm, INIT_PID, "parent");
    let dead = fork(&pm, parent, "dead");
    let live = fork(&pm, parent, "live");
    pm.exit(dead).unwrap();

    let out = pm.propagate_nice(parent, 4).unwrap();
    assert_eq!(out.niceness, 4);
    assert_eq!(out.skipped, 1);
    assert_eq!(pm.niceness(live).unwrap(), 2);
    assert_eq!(pm.get_process(dead).unwrap().niceness, 0);
}

#[test]
fn test_partial_success_with_clamped_child() {
    let pm = manager();
    let parent = fork(&pm, INIT_PID, "parent");
    let live = fork(&pm, parent, "live");
    let dead = fork(&pm, parent, "dead");
    pm.set_niceness(parent, 10).unwrap();
    pm.set_niceness(live, 19).unwrap();
    pm.exit(dead).unwrap();

    assert_eq!(pm.propagate_nice(parent, 2).unwrap().niceness, 12);
    assert_eq!(pm.niceness(live).unwrap(), 19);
}

#[test]
fn test_no_children() {
    let pm = manager();
    let parent = fork(&pm, INIT_PID, "parent");
    let out = pm.propagate_nice(parent, 4).unwrap();
    assert_eq!(out.niceness, 4);
    assert_eq!(out.descendants_visited, 0);
}

#[test]
fn test_multi_level_hierarchy() {
    let pm = manager();
    let p1 = fork(&pm, INIT_PID, "p1");
    let p2 = fork(&pm, p1, "p2");
    let p3 = fork(&pm, p2, "p3");
    let p4 = fork(&pm, p3, "p4");

    pm.propagate_nice(p1, 8).unwrap();
    let got: Vec<i32> = [p1, p2, p3, p4]
        .iter()
        .map(|pid| pm.niceness(*pid).unwrap())
        .collect();
    assert_eq!(got, vec![8, 4, 2, 1]);
}

#[test]
fn test_increment_one_stops_after_caller() {
    let pm = manager();
    let parent = fork(&pm, INIT_PID, "parent");
    let child = fork(&pm, parent, "child");
    let grandchild = fork(&pm, child, "grandchild");

    pm.propagate_nice(parent, 1).unwrap();
    assert_eq!(pm.niceness(parent).unwrap(), 1);
    assert_eq!(pm.niceness(child).unwrap(), 0);
    assert_eq!(pm.niceness(grandchild).unwrap(), 0);
}

#[test]
fn test_wide_tree_every_branch_updated() {
    let pm = manager();
    let root = fork(&pm, INIT_PID, "root");
    let children: Vec<Pid> = (0..16).map(|i| fork(&pm, root, &format!("c{}", i))).collect();
    let grandchildren: Vec<Pid> = children
        .iter()
        .map(|c| fork(&pm, *c, "gc"))
        .collect();

    let out = pm.propagate_nice(root, 6).unwrap();
    assert_eq!(out.descendants_visited, 32);
    assert!(children.iter().all(|c| pm.niceness(*c).unwrap() == 3));
    assert!(grandchildren.iter().all(|g| pm.niceness(*g).unwrap() == 1));
}

#[test]
fn test_decay_bounds_walk_on_deep_chain() {
    let pm = manager();
    let mut parent = INIT_PID;
    let mut first = None;
    for i in 0..1_000 {
        parent = fork(&pm, parent, &format!("d{}", i));
        first.get_or_insert(parent);
    }

    let out = pm.propagate_nice(first.unwrap(), 19).unwrap();
    assert_eq!(out.niceness, 19);
    // 19 -> 9 -> 4 -> 2 -> 1 -> 0
    assert_eq!(out.descendants_visited, 4);

    let out = pm.propagate_nice(first.unwrap(), i32::MAX).unwrap();
    assert_eq!(out.descendants_visited, 30);
}

/*!
 * Process Lifecycle Tests
 * fork / exit / reap hooks and the attributes they carry
 */

use lineage_kernel::core::limits::INIT_PID;
use lineage_kernel::{
    CpuSet, ProcessError, ProcessLifecycle, ProcessManager, ProcessState, SchedulingControl,
};
use pretty_assertions::assert_eq;

fn manager() -> ProcessManager {
    ProcessManager::builder().with_cpus(4).build().unwrap()
}

#[test]
fn test_boot_has_only_init() {
    let pm = manager();
    let list = pm.list_processes();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].pid, INIT_PID);
    assert_eq!(list[0].ppid, None);
    assert_eq!(list[0].affinity, CpuSet::first_n(4));
}

#[test]
fn test_fork_inherits_attributes() {
    let pm = manager();
    let parent = pm.fork(INIT_PID, "parent".into()).unwrap();
    pm.set_niceness(parent, 5).unwrap();
    pm.set_affinity(parent, "1-2".parse().unwrap()).unwrap();

    let child = pm.fork(parent, "child".into()).unwrap();
    let info = pm.get_process(child).unwrap();
    assert_eq!(info.name, "child");
    assert_eq!(info.ppid, Some(parent));
    assert_eq!(info.niceness, 5);
    assert_eq!(info.affinity.to_string(), "1-2");
    assert_eq!(pm.get_process(parent).unwrap().children, vec![child]);
}

#[test]
fn test_fork_from_missing_parent() {
    let pm = manager();
    assert_eq!(
        pm.fork(77, "orphan".into()).unwrap_err(),
        ProcessError::NoSuchProcess(77)
    );
}

#[test]
fn test_exit_then_reap() {
    let pm = manager();
    let parent = pm.fork(INIT_PID, "parent".into()).unwrap();
    let child = pm.fork(parent, "child".into()).unwrap();

    pm.exit(child).unwrap();
    assert_eq!(pm.get_process(child).unwrap().state, ProcessState::Zombie);
    assert!(!pm.exists(child));
    assert!(matches!(pm.exit(child), Err(ProcessError::NoSuchProcess(_))));

    // Only the real parent may reap
    assert!(pm.reap(INIT_PID, child).is_err());
    pm.reap(parent, child).unwrap();
    assert!(pm.get_process(child).is_none());
    assert!(pm.get_process(parent).unwrap().children.is_empty());
}

#[test]
fn test_orphans_reparented_and_reaped_by_init() {
    let pm = manager();
    let parent = pm.fork(INIT_PID, "parent".into()).unwrap();
    let a = pm.fork(parent, "a".into()).unwrap();
    let b = pm.fork(parent, "b".into()).unwrap();

    pm.exit(parent).unwrap();
    for pid in [a, b] {
        assert_eq!(pm.get_process(pid).unwrap().ppid, Some(INIT_PID));
    }

    pm.exit(a).unwrap();
    // parent and a are zombies under init
    assert_eq!(pm.reap_orphans(), 2);
    assert!(pm.get_process(a).is_none());
    assert!(pm.get_process(b).is_some());
}

#[test]
fn test_init_cannot_exit() {
    let pm = manager();
    assert!(matches!(
        pm.exit(INIT_PID),
        Err(ProcessError::InvalidArgument(_))
    ));
}

#[test]
fn test_niceness_clamps_both_ways() {
    let pm = manager();
    let pid = pm.fork(INIT_PID, "p".into()).unwrap();
    assert_eq!(pm.set_niceness(pid, 100).unwrap(), 19);
    assert_eq!(pm.set_niceness(pid, -100).unwrap(), -20);
    assert_eq!(pm.niceness(pid).unwrap(), -20);
}

#[test]
fn test_affinity_validation() {
    let pm = manager();
    let pid = pm.fork(INIT_PID, "p".into()).unwrap();
    assert!(matches!(
        pm.set_affinity(pid, CpuSet::new()),
        Err(ProcessError::InvalidArgument(_))
    ));
    assert!(matches!(
        pm.set_affinity(pid, CpuSet::single(4)),
        Err(ProcessError::InvalidArgument(_))
    ));
    pm.set_affinity(pid, CpuSet::single(3)).unwrap();
    assert_eq!(pm.affinity(pid).unwrap(), CpuSet::single(3));
}

#[test]
fn test_process_info_serializes() {
    let pm = manager();
    let pid = pm.fork(INIT_PID, "p".into()).unwrap();
    let json = serde_json::to_value(pm.get_process(pid).unwrap()).unwrap();
    assert_eq!(json["name"], "p");
    assert_eq!(json["affinity"], "0-3");
}

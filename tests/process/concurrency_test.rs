/*!
 * Concurrency Tests
 * Fork, exit, propagation and ancestry racing on one process table
 */

use lineage_kernel::core::limits::INIT_PID;
use lineage_kernel::{
    Pid, ProcessLifecycle, ProcessLineage, ProcessManager, ProcessState, SchedulingControl,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn manager() -> ProcessManager {
    ProcessManager::builder().with_cpus(4).build().unwrap()
}

#[test]
fn test_concurrent_forks_get_unique_pids() {
    let pm = Arc::new(manager());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let pm = Arc::clone(&pm);
            thread::spawn(move || {
                (0..200)
                    .map(|i| pm.fork(INIT_PID, format!("t{}-{}", t, i)).unwrap())
                    .collect::<Vec<Pid>>()
            })
        })
        .collect();

    let mut pids: Vec<Pid> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    pids.sort_unstable();
    pids.dedup();
    assert_eq!(pids.len(), 1_600);
    assert_eq!(pm.get_process(INIT_PID).unwrap().children.len(), 1_600);
}

#[test]
fn test_propagation_races_with_fork_and_exit() {
    let pm = Arc::new(manager());
    let root = pm.fork(INIT_PID, "root".into()).unwrap();
    let mids: Vec<Pid> = (0..8)
        .map(|i| pm.fork(root, format!("mid{}", i)).unwrap())
        .collect();

    let forker = {
        let pm = Arc::clone(&pm);
        let mids = mids.clone();
        thread::spawn(move || {
            for round in 0..100 {
                let parent = mids[round % mids.len()];
                if let Ok(child) = pm.fork(parent, "leaf".into()) {
                    if round % 3 == 0 {
                        let _ = pm.exit(child);
                    }
                }
            }
        })
    };

    let propagators: Vec<_> = (0..4)
        .map(|_| {
            let pm = Arc::clone(&pm);
            thread::spawn(move || {
                for _ in 0..50 {
                    pm.propagate_nice(root, 3).unwrap();
                }
            })
        })
        .collect();

    let walker = {
        let pm = Arc::clone(&pm);
        let mids = mids.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                for mid in &mids {
                    assert_eq!(pm.ancestor_pid(*mid, 0, 1).unwrap(), root);
                }
            }
        })
    };

    forker.join().unwrap();
    walker.join().unwrap();
    for handle in propagators {
        handle.join().unwrap();
    }

    for info in pm.list_processes() {
        assert!((-20..=19).contains(&info.niceness), "{:?}", info);
        if info.state != ProcessState::Zombie {
            if let Some(ppid) = info.ppid {
                let parent = pm.get_process(ppid).unwrap();
                assert!(parent.children.contains(&info.pid));
            }
        }
    }
    assert_eq!(pm.niceness(root).unwrap(), 19);
}

#[test]
fn test_exit_while_children_fork() {
    let pm = Arc::new(manager());
    for _ in 0..20 {
        let parent = pm.fork(INIT_PID, "parent".into()).unwrap();

        let forker = {
            let pm = Arc::clone(&pm);
            thread::spawn(move || {
                (0..50)
                    .filter_map(|_| pm.fork(parent, "child".into()).ok())
                    .collect::<Vec<Pid>>()
            })
        };
        let _ = pm.exit(parent);
        let children = forker.join().unwrap();

        // Every child that made it in was handed to init
        for child in children {
            assert_eq!(pm.ancestor_pid(child, 0, 1).unwrap(), INIT_PID);
        }
    }
}

#[test]
fn test_ancestor_resolves_while_parent_exits() {
    let pm = manager();
    for _ in 0..500 {
        let parent = pm.fork(INIT_PID, "parent".into()).unwrap();
        let child = pm.fork(parent, "child".into()).unwrap();
        let start = Barrier::new(2);
        let done = AtomicBool::new(false);

        let failures = thread::scope(|s| {
            let walker = s.spawn(|| {
                start.wait();
                let mut failures = 0;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    match pm.ancestor_pid(child, 0, 1) {
                        Ok(p) if p == parent || p == INIT_PID => {}
                        _ => failures += 1,
                    }
                    if finished {
                        break failures;
                    }
                }
            });

            start.wait();
            pm.exit(parent).unwrap();
            done.store(true, Ordering::Release);
            walker.join().unwrap()
        });

        // A live child always has a chain to init, mid-exit or not
        assert_eq!(failures, 0);
        assert_eq!(pm.ancestor_pid(child, 0, 1).unwrap(), INIT_PID);

        pm.exit(child).unwrap();
        pm.reap_orphans();
    }
}

#[test]
fn test_reap_racing_parent_exit_leaves_no_stale_link() {
    let pm = manager();
    for _ in 0..300 {
        let parent = pm.fork(INIT_PID, "parent".into()).unwrap();
        let child = pm.fork(parent, "child".into()).unwrap();
        pm.exit(child).unwrap();
        let start = Barrier::new(2);

        thread::scope(|s| {
            s.spawn(|| {
                start.wait();
                let _ = pm.reap(parent, child);
            });
            start.wait();
            pm.exit(parent).unwrap();
        });

        // Either the reap won and the child is gone everywhere, or the exit
        // won and the zombie child now hangs off init
        let in_table = pm.get_process(child).is_some();
        let under_init = pm
            .get_process(INIT_PID)
            .unwrap()
            .children
            .contains(&child);
        assert_eq!(in_table, under_init, "child {}", child);

        pm.reap_orphans();
        assert_eq!(pm.list_processes().len(), 1);
    }
}

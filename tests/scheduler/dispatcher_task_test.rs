/*!
 * Dispatcher Task Tests
 * Background ticking on the tokio runtime with the monotonic clock
 */

use lineage_kernel::core::limits::INIT_PID;
use lineage_kernel::{Pid, ProcessLifecycle, ProcessManager, SchedulingControl};
use std::time::Duration;

fn manager() -> ProcessManager {
    ProcessManager::builder()
        .with_cpus(2)
        .with_quantum(Duration::from_millis(1))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_background_task_accumulates_exec_time() {
    let pm = manager();
    let workers: Vec<Pid> = (0..3)
        .map(|i| pm.fork(INIT_PID, format!("w{}", i)).unwrap())
        .collect();

    let task = pm.spawn_dispatcher();
    tokio::time::sleep(Duration::from_millis(40)).await;
    task.shutdown().await;

    let total_slices: u64 = workers
        .iter()
        .map(|pid| pm.schedstat(*pid).unwrap().timeslice_count)
        .sum();
    assert!(total_slices >= 2);
    assert!(workers
        .iter()
        .any(|pid| pm.schedstat(*pid).unwrap().exec_time_ns > 0));
}

#[tokio::test]
async fn test_paused_task_does_not_dispatch() {
    let pm = manager();
    let task = pm.spawn_dispatcher();
    task.pause();
    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let pid = pm.fork(INIT_PID, "late".into()).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(pm.schedstat(pid).unwrap().timeslice_count, 0);

    task.resume();
    tokio::time::sleep(Duration::from_millis(10)).await;
    task.shutdown().await;
    assert_eq!(pm.schedstat(pid).unwrap().timeslice_count, 1);
}

#[tokio::test]
async fn test_drop_stops_task() {
    let pm = manager();
    let pid = pm.fork(INIT_PID, "w".into()).unwrap();
    {
        let _task = pm.spawn_dispatcher();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let slices = pm.schedstat(pid).unwrap().timeslice_count;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(pm.schedstat(pid).unwrap().timeslice_count, slices);
}

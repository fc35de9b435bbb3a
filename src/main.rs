/*!
 * Lineage Kernel - Main Entry Point
 *
 * Boots the process subsystem and walks through:
 * - ancestor_pid lookups from a three-generation tree
 * - propagate_nice over live, clamped and dead descendants
 * - schedstat output for pinned, spread and idle processes
 * - a short live run under the background dispatcher
 */

use anyhow::{Context, Result};
use lineage_kernel::core::limits::{INIT_PID, SYS_ANCESTOR_PID, SYS_PROPAGATE_NICE};
use lineage_kernel::{
    init_tracing, CpuSet, KernelConfig, ManualClock, Pid, ProcessLifecycle, ProcessManager,
    SchedulingControl, SyscallExecutor,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = KernelConfig::load().context("Failed to load kernel configuration")?;
    info!(?config, "Lineage kernel starting");

    ancestry_walkthrough(&config)?;
    propagation_walkthrough(&config)?;
    schedstat_walkthrough(&config)?;
    live_run(&config).await?;

    info!("All walkthroughs complete");
    Ok(())
}

fn executor(config: &KernelConfig) -> Result<SyscallExecutor> {
    let manager = ProcessManager::builder()
        .with_config(config.clone())
        .build()
        .context("Failed to build process manager")?;
    Ok(SyscallExecutor::new(manager))
}

fn call_ancestor(exec: &SyscallExecutor, caller: Pid, pid: i64, n: i64) {
    let ret = exec.syscall(caller, SYS_ANCESTOR_PID, &[pid, n]);
    if ret < 0 {
        println!(
            "ancestor_pid(pid={}, n={}) failed: {}",
            pid,
            n,
            nix::errno::Errno::from_raw(-ret as i32)
        );
    } else {
        println!("ancestor_pid(pid={}, n={}) => {}", pid, n, ret);
    }
}

fn ancestry_walkthrough(config: &KernelConfig) -> Result<()> {
    println!("\n== ancestor_pid ==");
    let exec = executor(config)?;
    let pm = exec.manager();

    let p1 = pm.fork(INIT_PID, "p1".into())?;
    let p2 = pm.fork(p1, "p2".into())?;
    let p3 = pm.fork(p2, "p3".into())?;
    println!("P1={} P2={} P3={}", p1, p2, p3);

    for (pid, n) in [(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (-5, 0), (0, 999)] {
        call_ancestor(&exec, p3, pid, n);
    }
    Ok(())
}

fn propagation_walkthrough(config: &KernelConfig) -> Result<()> {
    println!("\n== propagate_nice ==");
    let exec = executor(config)?;
    let pm = exec.manager();

    let parent = pm.fork(INIT_PID, "parent".into())?;
    let child = pm.fork(parent, "child".into())?;
    let grandchild = pm.fork(child, "grandchild".into())?;
    let dead = pm.fork(parent, "dead".into())?;
    pm.exit(dead)?;

    let ret = exec.syscall(parent, SYS_PROPAGATE_NICE, &[4]);
    println!(
        "propagate_nice(4) => {}; child={} grandchild={}",
        ret,
        pm.niceness(child)?,
        pm.niceness(grandchild)?
    );

    let ret = exec.syscall(parent, SYS_PROPAGATE_NICE, &[0]);
    println!("propagate_nice(0) => {} (parent still {})", ret, pm.niceness(parent)?);

    pm.set_niceness(parent, 18)?;
    pm.set_niceness(child, 18)?;
    let ret = exec.syscall(parent, SYS_PROPAGATE_NICE, &[3]);
    println!("propagate_nice(3) from 18 => {}; child={}", ret, pm.niceness(child)?);

    Ok(())
}

fn schedstat_walkthrough(config: &KernelConfig) -> Result<()> {
    println!("\n== schedstat ==");
    let clock = Arc::new(ManualClock::new());
    let manager = ProcessManager::builder()
        .with_config(config.clone())
        .with_cpus(config.num_cpus.max(2))
        .with_clock(clock.clone())
        .build()
        .context("Failed to build simulated process manager")?;
    let exec = SyscallExecutor::new(manager.clone());
    let quantum = config.quantum();

    let pinned = manager.fork(INIT_PID, "pinned".into())?;
    manager.set_affinity(pinned, CpuSet::single(0))?;
    let spread = manager.fork(INIT_PID, "spread".into())?;
    manager.set_affinity(spread, "0-1".parse()?)?;
    let rival = manager.fork(INIT_PID, "rival".into())?;
    manager.set_affinity(rival, "0-1".parse()?)?;

    for _ in 0..8 {
        manager.tick();
        clock.advance(quantum);
    }

    for pid in [pinned, spread] {
        let line = exec.read_proc(pid, "/proc/self/schedstat")?;
        print!("/proc/{}/schedstat: {}", pid, line);
    }

    let before = manager.schedstat(spread)?;
    manager.sleep(spread)?;
    clock.advance(config.epoch_length() + quantum);
    manager.set_affinity(spread, CpuSet::single(1))?;
    manager.wake(spread)?;
    for _ in 0..4 {
        manager.tick();
        clock.advance(quantum);
    }
    let after = manager.schedstat(spread)?;
    println!("epoch reset: before [{}] after [{}]", before.cpus, after.cpus);

    Ok(())
}

async fn live_run(config: &KernelConfig) -> Result<()> {
    println!("\n== live dispatcher ==");
    let exec = executor(config)?;
    let pm = exec.manager().clone();

    let workers = (0..config.num_cpus + 1)
        .map(|i| pm.fork(INIT_PID, format!("worker-{}", i)))
        .collect::<Result<Vec<_>, _>>()?;

    let task = pm.spawn_dispatcher();
    tokio::time::sleep(Duration::from_millis(50)).await;
    task.shutdown().await;

    for pid in workers {
        print!("/proc/{}/schedstat: {}", pid, exec.read_proc(INIT_PID, &format!("/proc/{}/schedstat", pid))?);
    }
    info!(stats = ?pm.accounting_stats(), "Live run finished");
    Ok(())
}

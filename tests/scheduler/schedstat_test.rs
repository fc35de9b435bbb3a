/*!
 * Schedstat Tests
 * Epoch-windowed accounting driven through the dispatcher
 */

use lineage_kernel::core::limits::INIT_PID;
use lineage_kernel::{
    CpuSet, ManualClock, Pid, ProcessLifecycle, ProcessManager, SchedStat, SchedulingControl,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const QUANTUM: Duration = Duration::from_millis(10);
const EPOCH: Duration = Duration::from_secs(1);

struct Sim {
    clock: Arc<ManualClock>,
    pm: ProcessManager,
}

impl Sim {
    fn new(cpus: usize) -> Self {
        let clock = Arc::new(ManualClock::new());
        let pm = ProcessManager::builder()
            .with_clock(clock.clone())
            .with_cpus(cpus)
            .with_quantum(QUANTUM)
            .with_epoch_length(EPOCH)
            .build()
            .unwrap();
        Self { clock, pm }
    }

    fn spawn(&self, name: &str, cpus: &str) -> Pid {
        let pid = self.pm.fork(INIT_PID, name.into()).unwrap();
        self.pm.set_affinity(pid, cpus.parse().unwrap()).unwrap();
        pid
    }

    /// Tick, then let one quantum pass
    fn run(&self, quanta: usize) {
        for _ in 0..quanta {
            self.pm.tick();
            self.clock.advance(QUANTUM);
        }
        self.pm.tick();
    }

    fn stat(&self, pid: Pid) -> SchedStat {
        self.pm.schedstat(pid).unwrap()
    }
}

#[test]
fn test_format_fields() {
    let sim = Sim::new(1);
    let pid = sim.spawn("busy", "0");
    sim.run(3);

    let stat = sim.stat(pid);
    assert_eq!(stat.exec_time_ns, 30_000_000);
    assert_eq!(stat.wait_time_ns, 0);
    assert_eq!(stat.timeslice_count, 1);
    assert_eq!(stat.to_string(), "30000000 0 1 [0]");
}

#[test]
fn test_single_cpu_affinity() {
    let sim = Sim::new(4);
    let pid = sim.spawn("pinned", "0");
    sim.run(5);
    assert_eq!(sim.stat(pid).cpus.to_string(), "0");
}

#[test]
fn test_multi_cpu_affinity() {
    let sim = Sim::new(2);
    let a = sim.spawn("a", "0-1");
    let b = sim.spawn("b", "0-1");
    let c = sim.spawn("c", "0-1");
    sim.run(12);

    // Three processes rotating over two CPUs each visit both
    for pid in [a, b, c] {
        assert_eq!(sim.stat(pid).cpus, "0-1".parse::<CpuSet>().unwrap(), "pid {}", pid);
    }
}

#[test]
fn test_wait_time_accrues_while_queued() {
    let sim = Sim::new(1);
    let first = sim.spawn("first", "0");
    let second = sim.spawn("second", "0");
    sim.run(2);

    let stat = sim.stat(second);
    assert_eq!(stat.wait_time_ns, QUANTUM.as_nanos() as u64);
    assert_eq!(sim.stat(first).timeslice_count, 2);
}

#[test]
fn test_epoch_reset_after_idle() {
    let sim = Sim::new(2);
    let pid = sim.spawn("roamer", "0-1");
    let blocker = sim.spawn("blocker", "0");
    sim.run(4);
    let before = sim.stat(pid).cpus;

    sim.pm.sleep(pid).unwrap();
    sim.pm.exit(blocker).unwrap();
    sim.clock.advance(EPOCH + QUANTUM);
    sim.pm.set_affinity(pid, CpuSet::single(0)).unwrap();
    sim.pm.wake(pid).unwrap();
    sim.run(1);

    let after = sim.stat(pid);
    assert_eq!(after.cpus, CpuSet::single(0));
    assert_ne!(before, after.cpus);
    assert!(sim.pm.accounting_stats().epoch_rollovers >= 1);
}

#[test]
fn test_cpu_set_grows_within_epoch() {
    let sim = Sim::new(3);
    let pid = sim.spawn("mover", "0");
    sim.run(1);
    sim.pm.set_affinity(pid, CpuSet::single(2)).unwrap();
    sim.run(1);

    assert_eq!(sim.stat(pid).cpus.to_string(), "0,2");
}

#[test]
fn test_counters_monotonic() {
    let sim = Sim::new(2);
    let pids: Vec<Pid> = (0..4).map(|i| sim.spawn(&format!("w{}", i), "0-1")).collect();

    let mut last: Vec<SchedStat> = pids.iter().map(|p| sim.stat(*p)).collect();
    for _ in 0..20 {
        sim.run(1);
        for (pid, prev) in pids.iter().zip(last.iter_mut()) {
            let now = sim.stat(*pid);
            assert!(now.exec_time_ns >= prev.exec_time_ns);
            assert!(now.wait_time_ns >= prev.wait_time_ns);
            assert!(now.timeslice_count >= prev.timeslice_count);
            *prev = now;
        }
    }
}

#[test]
fn test_schedstat_line_parses_back() {
    let sim = Sim::new(2);
    let pid = sim.spawn("w", "0-1");
    sim.run(2);

    let stat = sim.stat(pid);
    let parsed: SchedStat = stat.to_string().parse().unwrap();
    assert_eq!(parsed, stat);
}

//! Process discovery and signalling.
//!
//! [`ProcessInspector`] is the capability seam the supervisor commands run
//! against; [`SysinfoInspector`] is the real implementation. Per-process
//! failures (vanished pid, permission denied) degrade to `false` or a
//! missing record and never abort a scan.

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, Signal, System};

/// Snapshot of one running process.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub pid: u32,
    /// Full command line, argv\[0\] first. Empty for kernel threads.
    pub cmdline: Vec<String>,
    /// Unix timestamp (seconds) the process started at.
    pub started_at: u64,
    /// CPU usage in percent; may exceed 100 on multi-core hosts.
    pub cpu_percent: f32,
    /// Resident memory as a share of total system memory, in percent.
    pub memory_percent: f32,
}

/// Process enumeration and signalling needed by the supervisor commands.
pub trait ProcessInspector {
    /// Snapshot every visible process, ordered by pid.
    fn list(&mut self) -> Vec<ProcessRecord>;

    /// Ask `pid` to shut down (SIGTERM). `false` when the signal could not
    /// be delivered.
    fn terminate(&mut self, pid: u32) -> bool;

    /// Force-kill `pid` (SIGKILL). `false` when the process was already gone.
    fn kill(&mut self, pid: u32) -> bool;

    /// Whether `pid` is still alive.
    fn is_running(&mut self, pid: u32) -> bool;
}

/// [`ProcessInspector`] backed by [`sysinfo`].
pub struct SysinfoInspector {
    sys: System,
}

impl SysinfoInspector {
    #[must_use]
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl Default for SysinfoInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessInspector for SysinfoInspector {
    fn list(&mut self) -> Vec<ProcessRecord> {
        // cpu_usage() needs two samples a short interval apart.
        self.sys.refresh_processes(ProcessesToUpdate::All, true);
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        self.sys.refresh_processes(ProcessesToUpdate::All, true);
        self.sys.refresh_memory();

        let total_memory = self.sys.total_memory();
        let mut records: Vec<ProcessRecord> = self
            .sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessRecord {
                pid: pid.as_u32(),
                cmdline: process
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy().into_owned())
                    .collect(),
                started_at: process.start_time(),
                cpu_percent: process.cpu_usage(),
                memory_percent: if total_memory == 0 {
                    0.0
                } else {
                    (process.memory() as f64 / total_memory as f64 * 100.0) as f32
                },
            })
            .collect();
        records.sort_by_key(|record| record.pid);
        records
    }

    fn terminate(&mut self, pid: u32) -> bool {
        self.sys
            .process(Pid::from_u32(pid))
            .and_then(|process| process.kill_with(Signal::Term))
            .unwrap_or(false)
    }

    fn kill(&mut self, pid: u32) -> bool {
        self.sys
            .process(Pid::from_u32(pid))
            .is_some_and(|process| process.kill())
    }

    fn is_running(&mut self, pid: u32) -> bool {
        let target = Pid::from_u32(pid);
        let refreshed = self.sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[target]),
            true,
            ProcessRefreshKind::nothing(),
        );
        refreshed > 0 && self.sys.process(target).is_some()
    }
}

//! The OS process collaborator contract.
//!
//! Every process is addressed by pid and re-resolved on each query, so a
//! handle held across calls can never outlive its process: staleness shows up
//! as `QueryError::NoSuchProcess` (or an unqueryable state) on the next use.
//! [`SystemQuery`] is the `sysinfo`-backed implementation; tests substitute
//! their own.

use std::error::Error;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};

/// Lifecycle state of a process, reduced to what the reporter cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Running,
    Sleeping,
    DiskSleep,
    Waking,
    Zombie,
    Stopped,
    Dead,
    Other,
}

impl ProcState {
    /// States in which resource queries are meaningful.
    pub fn is_queryable(self) -> bool {
        matches!(
            self,
            ProcState::Running | ProcState::Sleeping | ProcState::DiskSleep | ProcState::Waking
        )
    }
}

/// Failures the OS layer can report. Everything else a backend encounters is
/// expected to collapse into one of these two or into a benign default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    NoSuchProcess(u32),
    AccessDenied(u32),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::NoSuchProcess(pid) => write!(f, "no such process: pid {pid}"),
            QueryError::AccessDenied(pid) => write!(f, "access denied: pid {pid}"),
        }
    }
}

impl Error for QueryError {}

/// Pid-addressed view of live processes.
pub trait ProcessQuery: Send + Sync {
    fn status(&self, pid: u32) -> Result<ProcState, QueryError>;

    fn name(&self, pid: u32) -> Result<String, QueryError>;

    /// Resident memory in bytes.
    fn memory(&self, pid: u32) -> Result<u64, QueryError>;

    /// Transitive descendants of `pid`. Refreshes the whole process table, so
    /// callers keep it outside their own locks.
    fn children(&self, pid: u32) -> Result<Vec<u32>, QueryError>;

    /// Scalar CPU utilization percentage measured over `interval`. Blocks the
    /// caller for the interval; may exceed 100 for multi-threaded processes.
    fn cpu_percent(&self, pid: u32, interval: Duration) -> Result<f32, QueryError>;

    /// Logical core count as seen by the scheduler.
    fn core_count(&self) -> usize;
}

/// Is the process currently usable for reporting? Fails closed: any query
/// failure, including access denied, answers no.
pub fn is_valid_process(query: &dyn ProcessQuery, pid: u32) -> bool {
    query
        .status(pid)
        .map(|state| state.is_queryable())
        .unwrap_or(false)
}

/// `ProcessQuery` over a shared `sysinfo::System`.
pub struct SystemQuery {
    sys: Mutex<System>,
}

impl Default for SystemQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemQuery {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        SystemQuery {
            sys: Mutex::new(sys),
        }
    }

    // The guarded System is a plain snapshot table; a caller panicking
    // mid-refresh cannot leave it inconsistent.
    fn lock(&self) -> MutexGuard<'_, System> {
        self.sys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh_one(sys: &mut System, pid: u32, kind: ProcessRefreshKind) -> bool {
        let target = [Pid::from_u32(pid)];
        sys.refresh_processes_specifics(ProcessesToUpdate::Some(&target), true, kind) > 0
    }
}

fn map_status(status: ProcessStatus) -> ProcState {
    match status {
        ProcessStatus::Run => ProcState::Running,
        ProcessStatus::Sleep | ProcessStatus::Idle => ProcState::Sleeping,
        ProcessStatus::UninterruptibleDiskSleep => ProcState::DiskSleep,
        ProcessStatus::Waking => ProcState::Waking,
        ProcessStatus::Zombie => ProcState::Zombie,
        ProcessStatus::Stop => ProcState::Stopped,
        ProcessStatus::Dead => ProcState::Dead,
        _ => ProcState::Other,
    }
}

impl ProcessQuery for SystemQuery {
    fn status(&self, pid: u32) -> Result<ProcState, QueryError> {
        let mut sys = self.lock();
        Self::refresh_one(&mut sys, pid, ProcessRefreshKind::everything());
        sys.process(Pid::from_u32(pid))
            .map(|p| map_status(p.status()))
            .ok_or(QueryError::NoSuchProcess(pid))
    }

    fn name(&self, pid: u32) -> Result<String, QueryError> {
        let mut sys = self.lock();
        Self::refresh_one(&mut sys, pid, ProcessRefreshKind::everything());
        sys.process(Pid::from_u32(pid))
            .map(|p| p.name().to_string_lossy().into_owned())
            .ok_or(QueryError::NoSuchProcess(pid))
    }

    fn memory(&self, pid: u32) -> Result<u64, QueryError> {
        let mut sys = self.lock();
        Self::refresh_one(&mut sys, pid, ProcessRefreshKind::nothing().with_memory());
        sys.process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .ok_or(QueryError::NoSuchProcess(pid))
    }

    fn children(&self, pid: u32) -> Result<Vec<u32>, QueryError> {
        let mut sys = self.lock();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        let root = Pid::from_u32(pid);
        if sys.process(root).is_none() {
            return Err(QueryError::NoSuchProcess(pid));
        }

        // Walk pid/ppid links breadth-first from the root.
        let mut descendants = Vec::new();
        let mut frontier = vec![root];
        while let Some(parent) = frontier.pop() {
            for (child_pid, process) in sys.processes() {
                if process.parent() == Some(parent) {
                    descendants.push(child_pid.as_u32());
                    frontier.push(*child_pid);
                }
            }
        }
        Ok(descendants)
    }

    fn cpu_percent(&self, pid: u32, interval: Duration) -> Result<f32, QueryError> {
        {
            let mut sys = self.lock();
            if !Self::refresh_one(&mut sys, pid, ProcessRefreshKind::nothing().with_cpu()) {
                return Err(QueryError::NoSuchProcess(pid));
            }
        }
        // Two refreshes bracket the measurement window; the lock is released
        // in between so other queries are not blocked for the full interval.
        std::thread::sleep(interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));

        let mut sys = self.lock();
        Self::refresh_one(&mut sys, pid, ProcessRefreshKind::nothing().with_cpu());
        sys.process(Pid::from_u32(pid))
            .map(|p| p.cpu_usage())
            .ok_or(QueryError::NoSuchProcess(pid))
    }

    fn core_count(&self) -> usize {
        self.lock().cpus().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_is_queryable() {
        let query = SystemQuery::new();
        let pid = std::process::id();

        assert!(is_valid_process(&query, pid));
        assert!(!query.name(pid).unwrap().is_empty());
        assert!(query.memory(pid).unwrap() > 0);
        assert!(query.core_count() >= 1);
    }

    #[test]
    fn absent_pid_fails_closed() {
        let query = SystemQuery::new();
        // Pids this large do not exist on supported platforms.
        let bogus = u32::MAX - 1;

        assert!(!is_valid_process(&query, bogus));
        assert_eq!(query.memory(bogus), Err(QueryError::NoSuchProcess(bogus)));
        assert_eq!(query.children(bogus), Err(QueryError::NoSuchProcess(bogus)));
    }

    #[test]
    fn zombie_states_are_not_queryable() {
        assert!(ProcState::Running.is_queryable());
        assert!(ProcState::DiskSleep.is_queryable());
        assert!(!ProcState::Zombie.is_queryable());
        assert!(!ProcState::Dead.is_queryable());
        assert!(!ProcState::Other.is_queryable());
    }
}

//! In-memory `ProcessQuery` for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::query::{ProcState, ProcessQuery, QueryError};

pub struct FakeProc {
    pub name: String,
    pub parent: Option<u32>,
    pub state: ProcState,
    pub memory: u64,
    pub cpu: f32,
    /// Status stays readable but resource queries fail, the shape access
    /// denial takes on real systems.
    pub deny: bool,
    /// Resource queries report the process gone even though it still passes
    /// validation — an exit racing the read.
    pub vanish_on_read: bool,
}

impl FakeProc {
    pub fn new(name: &str, parent: Option<u32>) -> Self {
        FakeProc {
            name: name.to_string(),
            parent,
            state: ProcState::Running,
            memory: 0,
            cpu: 0.0,
            deny: false,
            vanish_on_read: false,
        }
    }
}

pub struct FakeQuery {
    pub procs: Mutex<HashMap<u32, FakeProc>>,
    pub cores: usize,
    /// Number of real (non-throttled) CPU measurements taken.
    pub cpu_measurements: AtomicUsize,
}

impl FakeQuery {
    pub fn new(cores: usize) -> Self {
        FakeQuery {
            procs: Mutex::new(HashMap::new()),
            cores,
            cpu_measurements: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, pid: u32, proc_: FakeProc) {
        self.procs.lock().unwrap().insert(pid, proc_);
    }

    pub fn remove(&self, pid: u32) {
        self.procs.lock().unwrap().remove(&pid);
    }

    pub fn measurements(&self) -> usize {
        self.cpu_measurements.load(Ordering::SeqCst)
    }
}

impl ProcessQuery for FakeQuery {
    fn status(&self, pid: u32) -> Result<ProcState, QueryError> {
        self.procs
            .lock()
            .unwrap()
            .get(&pid)
            .map(|p| p.state)
            .ok_or(QueryError::NoSuchProcess(pid))
    }

    fn name(&self, pid: u32) -> Result<String, QueryError> {
        self.procs
            .lock()
            .unwrap()
            .get(&pid)
            .map(|p| p.name.clone())
            .ok_or(QueryError::NoSuchProcess(pid))
    }

    fn memory(&self, pid: u32) -> Result<u64, QueryError> {
        let procs = self.procs.lock().unwrap();
        let proc_ = procs.get(&pid).ok_or(QueryError::NoSuchProcess(pid))?;
        if proc_.deny {
            return Err(QueryError::AccessDenied(pid));
        }
        if proc_.vanish_on_read {
            return Err(QueryError::NoSuchProcess(pid));
        }
        Ok(proc_.memory)
    }

    fn children(&self, pid: u32) -> Result<Vec<u32>, QueryError> {
        let procs = self.procs.lock().unwrap();
        if !procs.contains_key(&pid) {
            return Err(QueryError::NoSuchProcess(pid));
        }
        let mut descendants = Vec::new();
        let mut frontier = vec![pid];
        while let Some(parent) = frontier.pop() {
            for (child_pid, child) in procs.iter() {
                if child.parent == Some(parent) {
                    descendants.push(*child_pid);
                    frontier.push(*child_pid);
                }
            }
        }
        descendants.sort_unstable();
        Ok(descendants)
    }

    fn cpu_percent(&self, pid: u32, _interval: Duration) -> Result<f32, QueryError> {
        let procs = self.procs.lock().unwrap();
        let proc_ = procs.get(&pid).ok_or(QueryError::NoSuchProcess(pid))?;
        if proc_.deny {
            return Err(QueryError::AccessDenied(pid));
        }
        if proc_.vanish_on_read {
            return Err(QueryError::NoSuchProcess(pid));
        }
        self.cpu_measurements.fetch_add(1, Ordering::SeqCst);
        Ok(proc_.cpu)
    }

    fn core_count(&self) -> usize {
        self.cores
    }
}

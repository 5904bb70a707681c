//! Registry of processes observed while reporting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use super::metrics::CpuSampler;
use super::query::{ProcessQuery, is_valid_process};

struct CacheInner {
    /// pid -> last-known name. Names go stale harmlessly; validity is always
    /// re-checked against the OS before an entry is used.
    entries: HashMap<u32, String>,
    last_sweep: Instant,
}

/// Tracks the pids seen during child enumeration and purges dead ones lazily.
///
/// Eviction always goes through [`ProcessCache::remove`] (or the sweep, which
/// uses the same path) so the sampler's throttle state for a pid is released
/// together with its entry. A reused pid must start from a clean slate.
pub struct ProcessCache {
    inner: Mutex<CacheInner>,
    sampler: Arc<CpuSampler>,
    sweep_interval: Duration,
}

impl ProcessCache {
    pub fn new(sweep_interval: Duration, sampler: Arc<CpuSampler>) -> Self {
        ProcessCache {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            sampler,
            sweep_interval,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All transitive descendants of `parent` that are still alive, each
    /// registered in the cache. An invalid parent or a failed enumeration
    /// degrades to "no children"; a child that exited mid-enumeration is
    /// silently dropped.
    pub fn child_processes(&self, query: &dyn ProcessQuery, parent: u32) -> Vec<u32> {
        if !is_valid_process(query, parent) {
            return Vec::new();
        }

        // The full-table enumeration is the expensive syscall; keep it
        // outside the lock and merge results in under it.
        let children = match query.children(parent) {
            Ok(children) => children,
            Err(_) => return Vec::new(),
        };

        let mut inner = self.lock();
        self.sweep(query, &mut inner);

        let mut valid = Vec::with_capacity(children.len());
        for pid in children {
            if is_valid_process(query, pid) {
                let name = query.name(pid).unwrap_or_default();
                inner.entries.insert(pid, name);
                valid.push(pid);
            }
        }
        valid
    }

    /// Evict one pid, releasing its sampler state with it.
    pub fn remove(&self, pid: u32) {
        let mut inner = self.lock();
        self.evict(&mut inner, pid);
    }

    /// Evict everything. Called at plugin shutdown.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let pids: Vec<u32> = inner.entries.keys().copied().collect();
        for pid in pids {
            self.evict(&mut inner, pid);
        }
        self.sampler.clear();
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.lock().entries.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn evict(&self, inner: &mut CacheInner, pid: u32) {
        inner.entries.remove(&pid);
        self.sampler.forget(pid);
    }

    /// Remove stale entries, at most once per sweep interval regardless of
    /// call volume. Lock already held.
    fn sweep(&self, query: &dyn ProcessQuery, inner: &mut CacheInner) {
        if inner.last_sweep.elapsed() < self.sweep_interval {
            return;
        }

        let stale: Vec<u32> = inner
            .entries
            .keys()
            .copied()
            .filter(|&pid| !is_valid_process(query, pid))
            .collect();
        if !stale.is_empty() {
            debug!(count = stale.len(), "swept stale process cache entries");
        }
        for pid in stale {
            self.evict(inner, pid);
        }
        inner.last_sweep = Instant::now();
    }
}

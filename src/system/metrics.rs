//! Throttled per-process CPU sampling.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::query::{ProcessQuery, QueryError, is_valid_process};

/// Samples a process's CPU utilization and spreads it across logical cores.
///
/// One instance lives for the plugin lifetime, shared behind an `Arc`. The
/// per-pid timestamp map exists only to throttle: repeat samples for a pid
/// inside the sample interval return zeros without touching the OS, so rapid
/// repeated key presses cannot stack up blocking measurements.
pub struct CpuSampler {
    last_sample: Mutex<HashMap<u32, Instant>>,
    interval: Duration,
}

impl CpuSampler {
    pub fn new(interval: Duration) -> Self {
        CpuSampler {
            last_sample: Mutex::new(HashMap::new()),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, Instant>> {
        self.last_sample
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Per-core usage for `pid`, measured over the sample interval (blocks up
    /// to that long). Throttled or invalid processes yield a zero vector —
    /// "no data" is recoverable here. Only `AccessDenied` and a process that
    /// vanishes mid-measurement propagate.
    pub fn sample(&self, query: &dyn ProcessQuery, pid: u32) -> Result<Vec<f32>, QueryError> {
        let cores = query.core_count().max(1);

        {
            let mut last = self.lock();
            if let Some(stamp) = last.get(&pid) {
                if stamp.elapsed() < self.interval {
                    return Ok(vec![0.0; cores]);
                }
            }
            if !is_valid_process(query, pid) {
                return Ok(vec![0.0; cores]);
            }
            // Stamped before the measurement so overlapping callers throttle
            // for the whole window, not just after it completes.
            last.insert(pid, Instant::now());
        }

        let percent = query.cpu_percent(pid, self.interval)?;
        Ok(distribute(percent, cores))
    }

    /// The explicit entry point for callers that need "no data" and "gone"
    /// kept apart: an invalid process is an error here, not a zero vector.
    pub fn sample_checked(
        &self,
        query: &dyn ProcessQuery,
        pid: u32,
    ) -> Result<Vec<f32>, QueryError> {
        if !is_valid_process(query, pid) {
            return Err(QueryError::NoSuchProcess(pid));
        }
        self.sample(query, pid)
    }

    /// Drop throttle state for a pid. Paired with cache eviction so a reused
    /// pid never inherits a stale timestamp.
    pub fn forget(&self, pid: u32) {
        self.lock().remove(&pid);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Whether throttle state exists for `pid`.
    pub fn tracks(&self, pid: u32) -> bool {
        self.lock().contains_key(&pid)
    }
}

/// Spread a scalar utilization percentage across `cores` greedily: fill core 0
/// to 100, carry the remainder onward until the scalar is exhausted. Models a
/// multi-threaded process saturating whole cores first — a deliberate
/// simplification, not a measurement of actual core affinity.
pub fn distribute(percent: f32, cores: usize) -> Vec<f32> {
    let mut usage = vec![0.0; cores];
    let mut remaining = percent.max(0.0);
    for slot in usage.iter_mut() {
        if remaining <= 0.0 {
            break;
        }
        if remaining >= 100.0 {
            *slot = 100.0;
            remaining -= 100.0;
        } else {
            *slot = remaining;
            remaining = 0.0;
        }
    }
    usage
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::system::testutil::{FakeProc, FakeQuery};

    #[test]
    fn distribute_fills_lower_cores_first() {
        assert_eq!(distribute(250.0, 4), vec![100.0, 100.0, 50.0, 0.0]);
        assert_eq!(distribute(35.5, 2), vec![35.5, 0.0]);
        assert_eq!(distribute(0.0, 3), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn distribute_saturates_when_scalar_exceeds_capacity() {
        assert_eq!(distribute(900.0, 2), vec![100.0, 100.0]);
    }

    proptest! {
        #[test]
        fn distribute_invariants(percent in 0.0f32..2000.0, cores in 1usize..64) {
            let usage = distribute(percent, cores);
            prop_assert_eq!(usage.len(), cores);
            prop_assert!(usage.iter().all(|&u| (0.0..=100.0).contains(&u)));

            let total: f32 = usage.iter().sum();
            let expected = percent.min(100.0 * cores as f32);
            prop_assert!((total - expected).abs() < 0.01);

            // Lower indices fill first: nothing follows a non-full core.
            let mut saturated = true;
            for &u in &usage {
                if !saturated {
                    prop_assert_eq!(u, 0.0);
                }
                saturated = u >= 100.0;
            }
        }
    }

    #[test]
    fn second_sample_within_interval_is_throttled() {
        let query = FakeQuery::new(2);
        let mut proc_ = FakeProc::new("app", None);
        proc_.cpu = 150.0;
        query.insert(7, proc_);

        let sampler = CpuSampler::new(Duration::from_millis(250));

        let first = sampler.sample(&query, 7).unwrap();
        assert_eq!(first, vec![100.0, 50.0]);
        assert_eq!(query.measurements(), 1);

        let second = sampler.sample(&query, 7).unwrap();
        assert_eq!(second, vec![0.0, 0.0]);
        assert_eq!(query.measurements(), 1, "throttled call must not hit the OS");
    }

    #[test]
    fn sample_resumes_after_interval_elapses() {
        let query = FakeQuery::new(1);
        let mut proc_ = FakeProc::new("app", None);
        proc_.cpu = 40.0;
        query.insert(7, proc_);

        let sampler = CpuSampler::new(Duration::from_millis(10));
        assert_eq!(sampler.sample(&query, 7).unwrap(), vec![40.0]);
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(sampler.sample(&query, 7).unwrap(), vec![40.0]);
        assert_eq!(query.measurements(), 2);
    }

    #[test]
    fn invalid_process_yields_zeros_not_errors() {
        let query = FakeQuery::new(4);
        let sampler = CpuSampler::new(Duration::from_millis(250));

        assert_eq!(sampler.sample(&query, 999).unwrap(), vec![0.0; 4]);
        assert!(!sampler.tracks(999));
    }

    #[test]
    fn checked_sample_reports_vanished_process() {
        let query = FakeQuery::new(4);
        let sampler = CpuSampler::new(Duration::from_millis(250));

        assert_eq!(
            sampler.sample_checked(&query, 999),
            Err(QueryError::NoSuchProcess(999))
        );
    }

    #[test]
    fn access_denied_propagates_from_measurement() {
        let query = FakeQuery::new(1);
        let mut proc_ = FakeProc::new("svc", None);
        proc_.deny = true;
        query.insert(5, proc_);

        let sampler = CpuSampler::new(Duration::from_millis(250));
        assert_eq!(
            sampler.sample_checked(&query, 5),
            Err(QueryError::AccessDenied(5))
        );
    }

    #[test]
    fn forget_drops_throttle_state() {
        let query = FakeQuery::new(1);
        query.insert(7, FakeProc::new("app", None));

        let sampler = CpuSampler::new(Duration::from_millis(250));
        sampler.sample(&query, 7).unwrap();
        assert!(sampler.tracks(7));

        sampler.forget(7);
        assert!(!sampler.tracks(7));
    }
}

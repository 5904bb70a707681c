//! The plugin facade the host runtime drives.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use crate::config::Config;
use crate::error::ReportError;
use crate::host::{FocusProvider, Speech};
use crate::report::{average_cpu_report, per_core_report, ram_report};
use crate::system::cache::ProcessCache;
use crate::system::metrics::CpuSampler;
use crate::system::query::ProcessQuery;

/// Owns the cache, sampler, and host seams; exposes the three user actions.
///
/// Constructed once at plugin start and torn down with [`shutdown`]; nothing
/// here is ambient global state. A report mutex serializes the actions so
/// rapid repeated key presses cannot interleave cache or sampler mutation.
///
/// [`shutdown`]: ResourceReporter::shutdown
pub struct ResourceReporter {
    focus: Arc<dyn FocusProvider>,
    speech: Arc<dyn Speech>,
    query: Arc<dyn ProcessQuery>,
    sampler: Arc<CpuSampler>,
    cache: ProcessCache,
    report_lock: Mutex<()>,
}

impl ResourceReporter {
    pub fn new(
        config: &Config,
        focus: Arc<dyn FocusProvider>,
        speech: Arc<dyn Speech>,
        query: Arc<dyn ProcessQuery>,
    ) -> Self {
        let sampler = Arc::new(CpuSampler::new(config.timing.cpu_sample_interval()));
        let cache = ProcessCache::new(
            config.timing.cache_cleanup_interval(),
            Arc::clone(&sampler),
        );
        ResourceReporter {
            focus,
            speech,
            query,
            sampler,
            cache,
            report_lock: Mutex::new(()),
        }
    }

    /// Speak the focused program's physical RAM usage.
    pub fn announce_ram(&self) {
        self.announce(|| ram_report(self.focus.as_ref(), self.query.as_ref(), &self.cache));
    }

    /// Speak the focused program's CPU usage, core by core. Blocks up to one
    /// sample interval while measuring.
    pub fn announce_cpu_per_core(&self) {
        self.announce(|| {
            per_core_report(
                self.focus.as_ref(),
                self.query.as_ref(),
                &self.cache,
                &self.sampler,
            )
        });
    }

    /// Speak the focused program's average CPU usage across all cores.
    pub fn announce_cpu_average(&self) {
        self.announce(|| {
            average_cpu_report(
                self.focus.as_ref(),
                self.query.as_ref(),
                &self.cache,
                &self.sampler,
            )
        });
    }

    /// Release all tracked state. Failures are logged, never propagated, so
    /// host teardown always completes.
    pub fn shutdown(&self) {
        let result = catch_unwind(AssertUnwindSafe(|| self.cache.clear()));
        match result {
            Ok(()) => info!("resource reporter shut down"),
            Err(_) => warn!("resource reporter shutdown panicked; state may leak"),
        }
    }

    /// Run one report under the report lock and speak the outcome. A panic in
    /// the pipeline becomes the generic failure phrase; the host must never
    /// unwind through a key handler.
    fn announce(&self, build: impl FnOnce() -> Result<String, ReportError>) {
        let _serialized = self
            .report_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let result = catch_unwind(AssertUnwindSafe(build))
            .unwrap_or_else(|_| Err(ReportError::Failure("report panicked".into())));

        match result {
            Ok(message) => self.speech.speak(&message),
            Err(err) => {
                if let ReportError::Failure(cause) = &err {
                    warn!(cause = %cause, "report failed");
                }
                self.speech.speak(err.spoken_message());
            }
        }
    }
}

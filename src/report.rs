//! Aggregates a process tree's usage into one spoken summary.
//!
//! Per-process failures during aggregation are skipped — one dead child never
//! aborts a report. `AccessDenied` is the one exception: it climbs out so the
//! user hears the privilege problem instead of a generic failure.

use crate::error::ReportError;
use crate::format::{format_cpu_cores, format_size};
use crate::host::FocusProvider;
use crate::system::cache::ProcessCache;
use crate::system::collector::{FocusedProgram, expand_tree, resolve_focus};
use crate::system::metrics::CpuSampler;
use crate::system::query::{ProcessQuery, QueryError};

/// Element-wise merge of one sample into the running total. Shorter vectors
/// pad with zero; every core caps at 100 — a core cannot exceed 100% no
/// matter how many processes report load on it.
pub fn merge_core_usage(combined: &mut Vec<f32>, sample: &[f32]) {
    if combined.len() < sample.len() {
        combined.resize(sample.len(), 0.0);
    }
    for (total, &usage) in combined.iter_mut().zip(sample) {
        *total = (*total + usage).min(100.0);
    }
}

/// Combined utilization as a fraction of total system capacity, expressed as
/// a percentage in [0, 100]. Not the mean of the vector: the divisor is the
/// machine's core count even when the vector is shorter.
pub fn average_utilization(per_core: &[f32], cores: usize) -> f32 {
    if cores == 0 {
        return 0.0;
    }
    let capacity = 100.0 * cores as f32;
    let total: f32 = per_core.iter().sum();
    ((total / capacity) * 100.0).min(100.0)
}

fn focused_program(
    focus: &dyn FocusProvider,
    query: &dyn ProcessQuery,
) -> Result<FocusedProgram, ReportError> {
    resolve_focus(focus, query).ok_or(ReportError::NoFocusedProgram)
}

/// "{name} is using {size} of physical ram".
pub fn ram_report(
    focus: &dyn FocusProvider,
    query: &dyn ProcessQuery,
    cache: &ProcessCache,
) -> Result<String, ReportError> {
    let program = focused_program(focus, query)?;

    let mut total = 0u64;
    for pid in expand_tree(query, cache, &program) {
        match query.memory(pid) {
            Ok(bytes) => total += bytes,
            Err(QueryError::AccessDenied(_)) => return Err(ReportError::AccessDenied),
            // Exited mid-sum: skip, the rest of the tree still counts.
            Err(QueryError::NoSuchProcess(_)) => continue,
        }
    }

    if total == 0 {
        return Err(ReportError::ProcessEnded);
    }
    Ok(format!(
        "{} is using {} of physical ram",
        program.name,
        format_size(total)
    ))
}

/// "{name}, CPU Usage: Core 1: x.x%, ...".
pub fn per_core_report(
    focus: &dyn FocusProvider,
    query: &dyn ProcessQuery,
    cache: &ProcessCache,
    sampler: &CpuSampler,
) -> Result<String, ReportError> {
    let (program, combined) = combined_usage(focus, query, cache, sampler)?;
    Ok(format!(
        "{}, CPU Usage: {}",
        program.name,
        format_cpu_cores(&combined)
    ))
}

/// "{name}, Average CPU Usage: x.x%".
pub fn average_cpu_report(
    focus: &dyn FocusProvider,
    query: &dyn ProcessQuery,
    cache: &ProcessCache,
    sampler: &CpuSampler,
) -> Result<String, ReportError> {
    let (program, combined) = combined_usage(focus, query, cache, sampler)?;
    let average = average_utilization(&combined, query.core_count().max(1));
    Ok(format!(
        "{}, Average CPU Usage: {average:.1}%",
        program.name
    ))
}

fn combined_usage(
    focus: &dyn FocusProvider,
    query: &dyn ProcessQuery,
    cache: &ProcessCache,
    sampler: &CpuSampler,
) -> Result<(FocusedProgram, Vec<f32>), ReportError> {
    let program = focused_program(focus, query)?;

    let mut combined: Vec<f32> = Vec::new();
    for pid in expand_tree(query, cache, &program) {
        match sampler.sample_checked(query, pid) {
            Ok(sample) => merge_core_usage(&mut combined, &sample),
            Err(QueryError::AccessDenied(_)) => return Err(ReportError::AccessDenied),
            Err(QueryError::NoSuchProcess(_)) => continue,
        }
    }

    if combined.is_empty() {
        return Err(ReportError::ProcessEnded);
    }
    Ok((program, combined))
}

//! From focused UI element to a validated process tree.

use crate::host::FocusProvider;

use super::cache::ProcessCache;
use super::query::{ProcessQuery, is_valid_process};

/// The focused application, resolved to something reportable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusedProgram {
    pub name: String,
    pub pid: u32,
}

/// Map the host's focused element to a program name and root pid. Best-effort:
/// no focus, a vanished process, or an unreadable name all collapse to `None`.
pub fn resolve_focus(
    focus: &dyn FocusProvider,
    query: &dyn ProcessQuery,
) -> Option<FocusedProgram> {
    let pid = focus.focused_pid()?;
    if !is_valid_process(query, pid) {
        return None;
    }
    let name = query.name(pid).ok()?;
    Some(FocusedProgram { name, pid })
}

/// Root plus all still-valid descendants of an already-resolved program. The
/// cache's children are revalidated here since time has passed between
/// registration and use; the result may be empty if the program vanished.
pub fn expand_tree(
    query: &dyn ProcessQuery,
    cache: &ProcessCache,
    program: &FocusedProgram,
) -> Vec<u32> {
    let mut pids = vec![program.pid];
    pids.extend(cache.child_processes(query, program.pid));
    pids.retain(|&pid| is_valid_process(query, pid));
    pids
}

/// Resolve focus and expand it into a process tree in one step.
pub fn collect_tree(
    focus: &dyn FocusProvider,
    query: &dyn ProcessQuery,
    cache: &ProcessCache,
) -> Vec<u32> {
    match resolve_focus(focus, query) {
        Some(program) => expand_tree(query, cache, &program),
        None => Vec::new(),
    }
}

// Process locator implementation
// reason: sysinfo for the process table, scanned off the async runtime
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use sysinfo::System;
use tracing::debug;

use thermoguard_core::domain::ProcessId;
use thermoguard_core::port::ProcessLocator;

/// Snapshot of one process-table row relevant to matching
#[derive(Debug, Clone)]
struct Candidate {
    pid: ProcessId,
    cmdline: String,
    name: String,
}

/// Shells that commonly wrap the guard (`sh -c "thermal-guard --process x"`)
const WRAPPER_SHELLS: &[&str] = &["sh", "bash", "dash", "zsh", "fish", "ash", "ksh", "mksh"];

/// Process locator backed by sysinfo
///
/// Matches the filter as a substring of the command line (or the process
/// name when the command line is hidden). The guard itself is never a
/// candidate, since its command line carries the filter as an argument.
/// Its parent is skipped only when it is a wrapper shell; a target that
/// launched the guard directly stays findable. With several matches, the
/// lowest pid wins.
pub struct SysinfoProcessLocator {
    system: Arc<Mutex<System>>,
    excluded: Vec<ProcessId>,
}

impl SysinfoProcessLocator {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_processes();

        let excluded = match sysinfo::get_current_pid() {
            Ok(own) => {
                let parent = system
                    .process(own)
                    .and_then(|p| p.parent())
                    .and_then(|parent| system.process(parent))
                    .map(|parent| (parent.pid().as_u32(), parent.name()));
                excluded_pids(own.as_u32(), parent)
            }
            Err(_) => Vec::new(),
        };

        Self {
            system: Arc::new(Mutex::new(system)),
            excluded,
        }
    }
}

impl Default for SysinfoProcessLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessLocator for SysinfoProcessLocator {
    async fn find_process(&self, name_filter: &str) -> Option<ProcessId> {
        let system = Arc::clone(&self.system);
        let excluded = self.excluded.clone();
        let filter = name_filter.to_string();

        // Refreshing the process table walks /proc; keep it off the runtime
        let lookup = tokio::task::spawn_blocking(move || {
            let mut sys = system.lock().unwrap_or_else(PoisonError::into_inner);
            sys.refresh_processes();

            let candidates = sys.processes().iter().map(|(pid, process)| Candidate {
                pid: pid.as_u32(),
                cmdline: process.cmd().join(" "),
                name: process.name().to_string(),
            });
            select_match(candidates, &filter, &excluded)
        });

        match lookup.await {
            Ok(pid) => {
                debug!(filter = %name_filter, pid = ?pid, "Process lookup completed");
                pid
            }
            Err(e) => {
                debug!(error = %e, "Process lookup task failed");
                None
            }
        }
    }
}

/// True for a shell binary name, with or without a login `-` prefix
fn is_wrapper_shell(name: &str) -> bool {
    WRAPPER_SHELLS.contains(&name.trim_start_matches('-'))
}

/// The guard's own pid, plus its parent when that is a wrapper shell
fn excluded_pids(own: ProcessId, parent: Option<(ProcessId, &str)>) -> Vec<ProcessId> {
    let mut excluded = vec![own];
    if let Some((pid, name)) = parent {
        if is_wrapper_shell(name) {
            excluded.push(pid);
        }
    }
    excluded
}

/// Pick the lowest matching pid, skipping excluded ones
fn select_match(
    candidates: impl Iterator<Item = Candidate>,
    filter: &str,
    excluded: &[ProcessId],
) -> Option<ProcessId> {
    candidates
        .filter(|c| !excluded.contains(&c.pid))
        .filter(|c| {
            if c.cmdline.is_empty() {
                c.name.contains(filter)
            } else {
                c.cmdline.contains(filter)
            }
        })
        .map(|c| c.pid)
        .min()
}

// Managed Process Handle & Interventions

/// OS process id
pub type ProcessId = u32;

/// An action the guard can apply to (or undo on) the managed process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intervention {
    LowerPriority,
    RestorePriority,
    Suspend,
    Resume,
}

impl Intervention {
    /// True for actions that undo a previous intervention
    pub fn is_recovery(&self) -> bool {
        matches!(self, Intervention::RestorePriority | Intervention::Resume)
    }
}

impl std::fmt::Display for Intervention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intervention::LowerPriority => write!(f, "lower_priority"),
            Intervention::RestorePriority => write!(f, "restore_priority"),
            Intervention::Suspend => write!(f, "suspend"),
            Intervention::Resume => write!(f, "resume"),
        }
    }
}

/// The managed process and the guard's only persisted memory
///
/// `pid` is the locator result for the current tick. `target` is the pid
/// active interventions were applied to, so recovery reaches the same
/// process even when a later lookup misses it. Both flags start false and
/// are mutated only by the state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedProcess {
    pub pid: Option<ProcessId>,
    pub target: Option<ProcessId>,
    pub is_paused: bool,
    pub is_priority_lowered: bool,
}

impl ManagedProcess {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if any intervention is currently in effect
    pub fn is_intervened(&self) -> bool {
        self.is_paused || self.is_priority_lowered
    }

    /// Pid that recovery actions should address
    pub fn recovery_pid(&self) -> Option<ProcessId> {
        self.target.or(self.pid)
    }

    /// Record a successful intervention
    pub(crate) fn mark(&mut self, action: Intervention, pid: ProcessId) {
        match action {
            Intervention::LowerPriority => self.is_priority_lowered = true,
            Intervention::Suspend => self.is_paused = true,
            Intervention::RestorePriority => self.is_priority_lowered = false,
            Intervention::Resume => self.is_paused = false,
        }
        if self.is_intervened() {
            self.target = Some(pid);
        } else {
            self.target = None;
        }
    }

    /// Force both flags false (recovery is unconditional)
    pub(crate) fn clear(&mut self) {
        self.is_paused = false;
        self.is_priority_lowered = false;
        self.target = None;
    }
}

use std::fmt;

use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    Exited(i32),
    KilledBySignal(Signal),
}

impl TerminationOutcome {
    /// Maps a terminal wait status; stops, continues and "still alive" are
    /// not terminations and yield `None`.
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(TerminationOutcome::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(TerminationOutcome::KilledBySignal(signal)),
            _ => None,
        }
    }

    pub fn is_signaled(&self) -> bool {
        matches!(self, TerminationOutcome::KilledBySignal(_))
    }
}

impl Default for TerminationOutcome {
    fn default() -> Self {
        TerminationOutcome::Exited(0)
    }
}

impl fmt::Display for TerminationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationOutcome::Exited(code) => write!(f, "exit value {}", code),
            TerminationOutcome::KilledBySignal(signal) => {
                write!(f, "terminated by signal {}", *signal as i32)
            }
        }
    }
}

/// Last foreground outcome, as reported by `status`.
#[derive(Debug, Default)]
pub struct StatusTracker {
    last: TerminationOutcome,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: TerminationOutcome) {
        self.last = outcome;
    }

    pub fn last(&self) -> TerminationOutcome {
        self.last
    }
}

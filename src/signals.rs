//! Interrupt (SIGINT) disposition for the shell and the processes it spawns.
//!
//! The shell ignores interrupt at all times. Each spawn carries its own
//! [`Disposition`], installed in the child between fork and exec.

use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Ctrl-C terminates the process. Used for foreground children.
    Default,
    /// Ctrl-C is ignored. Used for the shell and background children.
    Ignore,
}

impl Disposition {
    pub fn for_background(background: bool) -> Self {
        if background {
            Disposition::Ignore
        } else {
            Disposition::Default
        }
    }

    fn handler(self) -> SigHandler {
        match self {
            Disposition::Default => SigHandler::SigDfl,
            Disposition::Ignore => SigHandler::SigIgn,
        }
    }

    /// Installs this disposition for SIGINT in the calling process.
    pub fn apply(self) -> Result<(), Errno> {
        // SAFETY: SigDfl and SigIgn run no user code in signal context.
        unsafe { signal::signal(Signal::SIGINT, self.handler()) }.map(|_| ())
    }
}

/// Restores the shell's baseline: interrupt never reaches the shell itself.
pub fn ignore_interrupt() -> Result<(), Errno> {
    Disposition::Ignore.apply()
}

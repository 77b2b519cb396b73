//! Error types for smallsh.
//!
//! Everything except [`ShellError`] is local to one command line: it is
//! reported and the loop moves on to the next prompt.

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use nix::unistd::Pid;

/// A line that could not be turned into a [`crate::command::Command`].
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("command line too long ({len} bytes, limit {limit})")]
    LineTooLong { len: usize, limit: usize },

    #[error("too many arguments ({count}, limit {limit})")]
    TooManyArguments { count: usize, limit: usize },

    #[error("expected filename after '{operator}'")]
    MissingRedirectTarget { operator: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum RedirectionError {
    #[error("cannot open {} for input: {source}", .path.display())]
    InputUnavailable { path: PathBuf, source: io::Error },

    #[error("cannot open {} for output: {source}", .path.display())]
    OutputUnavailable { path: PathBuf, source: io::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryChangeError {
    #[error("cd: HOME not set")]
    HomeUnset,

    #[error("cd: too many arguments")]
    TooManyArguments,

    #[error("cd: {}: {source}", .path.display())]
    Failed { path: PathBuf, source: io::Error },
}

#[derive(Debug, thiserror::Error)]
#[error("background job limit reached ({capacity} jobs running)")]
pub struct JobTableFull {
    pub capacity: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("{program}: argument contains a NUL byte")]
    InvalidArgument { program: String },

    #[error("unable to create a new process: {0}")]
    SpawnFailed(Errno),

    #[error("waiting for pid {pid} failed: {source}")]
    WaitFailed { pid: Pid, source: Errno },
}

impl LaunchError {
    /// Without process creation the shell cannot keep its promises, so only
    /// a failed fork ends the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LaunchError::SpawnFailed(_))
    }
}

/// Errors that end the shell.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("i/o error on the terminal: {0}")]
    Io(#[from] io::Error),
}

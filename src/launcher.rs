//! Fork/exec of external programs and the foreground wait.

use std::ffi::CString;

use colored::Colorize;
use nix::errno::Errno;
use nix::sys::wait::waitpid;
use nix::unistd::{execvp, fork, ForkResult, Pid};
use tracing::debug;

use crate::command::Command;
use crate::error::LaunchError;
use crate::redirects::Redirections;
use crate::signals::Disposition;
use crate::status::TerminationOutcome;

/// Status a child exits with when it could not become `program`.
pub const EXEC_FAILURE_STATUS: i32 = 1;

/// Starts `command` in a new process. `redirects` and `disposition` are
/// applied in the child right before the single exec; the parent's copies
/// of the redirection files are closed once this returns.
pub fn spawn(
    command: &Command,
    redirects: Redirections,
    disposition: Disposition,
) -> Result<Pid, LaunchError> {
    let invalid = || LaunchError::InvalidArgument {
        program: command.program.clone(),
    };
    let program = CString::new(command.program.as_str()).map_err(|_| invalid())?;
    // formatted before the fork: the child may only write raw bytes
    let diagnostic = format!("{}: {}: ", "smallsh".red().bold(), command.program);
    let argv = command
        .arguments
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    // SAFETY: the shell is single-threaded; the child only touches
    // descriptors and signal dispositions before exec or _exit.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!(pid = %child, program = %command.program, ?disposition, "spawned");
            drop(redirects);
            Ok(child)
        }
        Ok(ForkResult::Child) => exec_child(&diagnostic, &program, &argv, &redirects, disposition),
        Err(errno) => Err(LaunchError::SpawnFailed(errno)),
    }
}

fn exec_child(
    diagnostic: &str,
    program: &CString,
    argv: &[CString],
    redirects: &Redirections,
    disposition: Disposition,
) -> ! {
    let errno = match prepare_child(redirects, disposition) {
        Ok(()) => match execvp(program, argv) {
            Ok(never) => match never {},
            Err(errno) => errno,
        },
        Err(errno) => errno,
    };

    write_stderr(diagnostic.as_bytes());
    write_stderr(errno.desc().as_bytes());
    write_stderr(b"\n");

    // SAFETY: skips the parent's atexit handlers and buffered output.
    unsafe { libc::_exit(EXEC_FAILURE_STATUS) }
}

/// Unbuffered and lock-free, unlike `eprintln!`.
fn write_stderr(bytes: &[u8]) {
    // SAFETY: `bytes` outlives the call; a short or failed write is ignored.
    unsafe {
        libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

fn prepare_child(redirects: &Redirections, disposition: Disposition) -> Result<(), Errno> {
    disposition.apply()?;
    redirects
        .install()
        .map_err(|e| Errno::from_raw(e.raw_os_error().unwrap_or(libc::EBADF)))
}

/// Blocks until `pid` exits or is killed.
pub fn wait_foreground(pid: Pid) -> Result<TerminationOutcome, LaunchError> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(outcome) = TerminationOutcome::from_wait_status(status) {
                    debug!(%pid, %outcome, "foreground child finished");
                    return Ok(outcome);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(source) => return Err(LaunchError::WaitFailed { pid, source }),
        }
    }
}

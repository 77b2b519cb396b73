use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use crate::error::RedirectionError;

const OUTPUT_MODE: u32 = 0o644;

/// Opened redirection targets, ready to be installed in a child.
#[derive(Debug, Default)]
pub struct Redirections {
    stdin: Option<File>,
    stdout: Option<File>,
}

impl Redirections {
    /// Opens both targets before anything is spawned. The input side is
    /// checked first so a missing input never truncates the output file.
    pub fn resolve(input: Option<&str>, output: Option<&str>) -> Result<Self, RedirectionError> {
        let stdin = input
            .map(|path| {
                File::open(path).map_err(|source| RedirectionError::InputUnavailable {
                    path: PathBuf::from(path),
                    source,
                })
            })
            .transpose()?;

        let stdout = output
            .map(|path| {
                open_output(Path::new(path)).map_err(|source| RedirectionError::OutputUnavailable {
                    path: PathBuf::from(path),
                    source,
                })
            })
            .transpose()?;

        Ok(Self { stdin, stdout })
    }

    #[cfg(test)]
    pub fn has_stdin(&self) -> bool {
        self.stdin.is_some()
    }

    #[cfg(test)]
    pub fn has_stdout(&self) -> bool {
        self.stdout.is_some()
    }

    /// Feeds stdin from `/dev/null` unless an input file was already given.
    pub fn stdin_or_null(mut self) -> Result<Self, RedirectionError> {
        if self.stdin.is_none() {
            let null = Path::new("/dev/null");
            let file = File::open(null).map_err(|source| RedirectionError::InputUnavailable {
                path: null.to_path_buf(),
                source,
            })?;
            self.stdin = Some(file);
        }
        Ok(self)
    }

    /// Child side: duplicate the opened files onto fds 0 and 1. The
    /// originals are close-on-exec and vanish with the exec.
    pub fn install(&self) -> io::Result<()> {
        if let Some(file) = &self.stdin {
            dup_onto(file, libc::STDIN_FILENO)?;
        }
        if let Some(file) = &self.stdout {
            dup_onto(file, libc::STDOUT_FILENO)?;
        }
        Ok(())
    }
}

fn open_output(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(OUTPUT_MODE)
        .open(path)
}

fn dup_onto(file: &File, target: libc::c_int) -> io::Result<()> {
    // SAFETY: both descriptors are valid for the duration of the call.
    if unsafe { libc::dup2(file.as_raw_fd(), target) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

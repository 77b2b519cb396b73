use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::command::Command;
use crate::error::DirectoryChangeError;

/// Commands the shell runs itself, without spawning anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin<'a> {
    Exit,
    Cd(CdTarget<'a>),
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdTarget<'a> {
    Home,
    Path(&'a str),
    TooMany,
}

impl<'a> Builtin<'a> {
    /// `None` means the command is external.
    pub fn parse(command: &'a Command) -> Option<Self> {
        match command.program.as_str() {
            "exit" => Some(Builtin::Exit),
            "status" => Some(Builtin::Status),
            "cd" => {
                let target = match &command.arguments[1..] {
                    [] => CdTarget::Home,
                    [path] => CdTarget::Path(path),
                    _ => CdTarget::TooMany,
                };
                Some(Builtin::Cd(target))
            }
            _ => None,
        }
    }
}

/// Changes the shell's working directory. `home` is the value of `HOME`,
/// consulted only for [`CdTarget::Home`]. Returns the new directory.
pub fn change_directory(
    target: CdTarget<'_>,
    home: Option<OsString>,
) -> Result<PathBuf, DirectoryChangeError> {
    let destination = match target {
        CdTarget::Home => match home {
            Some(home) if !home.is_empty() => PathBuf::from(home),
            _ => return Err(DirectoryChangeError::HomeUnset),
        },
        CdTarget::Path(path) => resolve(Path::new(path))?,
        CdTarget::TooMany => return Err(DirectoryChangeError::TooManyArguments),
    };

    env::set_current_dir(&destination).map_err(|source| DirectoryChangeError::Failed {
        path: destination.clone(),
        source,
    })?;
    debug!(cwd = %destination.display(), "changed directory");
    Ok(destination)
}

fn resolve(path: &Path) -> Result<PathBuf, DirectoryChangeError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|source| DirectoryChangeError::Failed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cwd.join(path))
}

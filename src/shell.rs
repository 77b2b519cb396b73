use std::env;
use std::fmt::Display;
use std::io::{self, BufRead, Read, Write};

use colored::Colorize;
use tracing::{debug, warn};

use crate::builtins::{self, Builtin};
use crate::command::{Command, MAX_LINE_LEN};
use crate::config::Config;
use crate::error::{LaunchError, ParseError, ShellError};
use crate::jobs::JobTable;
use crate::launcher;
use crate::redirects::Redirections;
use crate::signals::{self, Disposition};
use crate::status::StatusTracker;

pub const PROMPT: &str = ": ";

/// Everything the shell remembers between command lines.
pub struct ShellState {
    pub status: StatusTracker,
    pub jobs: JobTable,
}

impl ShellState {
    pub fn new(max_jobs: usize) -> Self {
        Self {
            status: StatusTracker::new(),
            jobs: JobTable::new(max_jobs),
        }
    }
}

/// One line read from the input.
enum Line {
    Text(String),
    /// Longer than [`MAX_LINE_LEN`]; holds the full length, the bytes are gone.
    TooLong(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell<R, W> {
    input: R,
    out: W,
    state: ShellState,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, out: W, config: &Config) -> Self {
        Self {
            input,
            out,
            state: ShellState::new(config.max_jobs),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// Runs until `exit` or end of input. Only fatal errors escape.
    pub fn run(&mut self) -> Result<(), ShellError> {
        loop {
            self.report_finished_jobs()?;

            write!(self.out, "{}", PROMPT)?;
            self.out.flush()?;

            let line = match self.read_line()? {
                Some(Line::Text(line)) => line,
                Some(Line::TooLong(len)) => {
                    report(&ParseError::LineTooLong {
                        len,
                        limit: MAX_LINE_LEN,
                    });
                    continue;
                }
                None => {
                    debug!("end of input");
                    writeln!(self.out)?;
                    break;
                }
            };

            if self.eval(&line)? == Flow::Exit {
                break;
            }
        }

        // jobs that finished since the last prompt are reported, not counted
        self.report_finished_jobs()?;
        let pids: Vec<i32> = self
            .state
            .jobs
            .running()
            .map(|job| job.pid.as_raw())
            .collect();
        if !pids.is_empty() {
            warn!(count = pids.len(), ?pids, "exiting with background jobs still running");
        }
        Ok(())
    }

    /// Reads at most `MAX_LINE_LEN` bytes; the rest of an overlong line is
    /// skipped without being buffered.
    fn read_line(&mut self) -> io::Result<Option<Line>> {
        let mut buf = Vec::new();
        let limit = MAX_LINE_LEN as u64 + 1;
        if (&mut self.input).take(limit).read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        if buf.len() > MAX_LINE_LEN && buf.last() != Some(&b'\n') {
            let skipped = self.skip_rest_of_line()?;
            return Ok(Some(Line::TooLong(buf.len() + skipped)));
        }
        Ok(Some(Line::Text(String::from_utf8_lossy(&buf).into_owned())))
    }

    fn skip_rest_of_line(&mut self) -> io::Result<usize> {
        let mut skipped = 0;
        loop {
            let available = match self.input.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(skipped);
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.input.consume(end + 1);
                    return Ok(skipped + end + 1);
                }
                None => {
                    let len = available.len();
                    self.input.consume(len);
                    skipped += len;
                }
            }
        }
    }

    fn report_finished_jobs(&mut self) -> io::Result<()> {
        for notice in self.state.jobs.update_jobs() {
            writeln!(self.out, "{}", notice)?;
        }
        self.out.flush()
    }

    /// Handles one input line.
    pub fn eval(&mut self, line: &str) -> Result<Flow, ShellError> {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(e) => {
                report(&e);
                return Ok(Flow::Continue);
            }
        };

        match Builtin::parse(&command) {
            Some(Builtin::Exit) => return Ok(Flow::Exit),
            Some(Builtin::Status) => {
                writeln!(self.out, "{}", self.state.status.last())?;
            }
            Some(Builtin::Cd(target)) => {
                if let Err(e) = builtins::change_directory(target, env::var_os("HOME")) {
                    report(&e);
                }
            }
            None => self.launch(&command)?,
        }
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    fn launch(&mut self, command: &Command) -> Result<(), ShellError> {
        if command.background {
            if let Err(e) = self.state.jobs.ensure_capacity() {
                report(&e);
                return Ok(());
            }
        }

        let redirects = Redirections::resolve(
            command.input_redirect.as_deref(),
            command.output_redirect.as_deref(),
        );
        let redirects = match redirects {
            Ok(r) if command.background => r.stdin_or_null(),
            other => other,
        };
        let redirects = match redirects {
            Ok(r) => r,
            Err(e) => {
                report(&e);
                return Ok(());
            }
        };

        // nothing buffered may be duplicated into the child
        self.out.flush()?;
        io::stdout().flush()?;

        let disposition = Disposition::for_background(command.background);
        let pid = match launcher::spawn(command, redirects, disposition) {
            Ok(pid) => pid,
            Err(e) => return self.launch_failed(e),
        };

        if command.background {
            // capacity was checked before the fork
            if let Err(e) = self.state.jobs.register(pid) {
                report(&e);
            }
            writeln!(self.out, "background pid is {}", pid)?;
            return Ok(());
        }

        let outcome = launcher::wait_foreground(pid);
        if let Err(errno) = signals::ignore_interrupt() {
            warn!(%errno, "could not restore interrupt disposition");
        }
        match outcome {
            Ok(outcome) => {
                self.state.status.record(outcome);
                if outcome.is_signaled() {
                    writeln!(self.out, "{}", outcome)?;
                }
                Ok(())
            }
            Err(e) => self.launch_failed(e),
        }
    }

    fn launch_failed(&mut self, e: LaunchError) -> Result<(), ShellError> {
        if e.is_fatal() {
            return Err(e.into());
        }
        report(&e);
        Ok(())
    }
}

/// Prints a non-fatal diagnostic.
pub fn report(err: &dyn Display) {
    eprintln!("{}: {}", "smallsh".red().bold(), err);
}

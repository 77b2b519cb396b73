use std::fmt;

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::JobTableFull;
use crate::status::TerminationOutcome;

pub const DEFAULT_CAPACITY: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    /// Reaped, waiting for its notice to be handed out.
    Completed(TerminationOutcome),
}

#[derive(Debug)]
pub struct Job {
    pub pid: Pid,
    pub state: JobState,
}

/// Printed at the prompt boundary once a background job has been reaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobNotice {
    pub pid: Pid,
    pub outcome: TerminationOutcome,
}

impl fmt::Display for JobNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "background pid {} is done: {}", self.pid, self.outcome)
    }
}

/// Background processes in launch order, bounded by `capacity`.
pub struct JobTable {
    jobs: Vec<Job>,
    capacity: usize,
}

impl JobTable {
    pub fn new(capacity: usize) -> Self {
        JobTable {
            jobs: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Checked before forking, so a rejected launch never leaves an
    /// untracked child behind.
    pub fn ensure_capacity(&self) -> Result<(), JobTableFull> {
        if self.jobs.len() >= self.capacity {
            return Err(JobTableFull {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn register(&mut self, pid: Pid) -> Result<(), JobTableFull> {
        self.ensure_capacity()?;
        debug!(%pid, jobs = self.jobs.len() + 1, "registered background job");
        self.jobs.push(Job {
            pid,
            state: JobState::Running,
        });
        Ok(())
    }

    pub fn running(&self) -> impl Iterator<Item = &Job> {
        self.jobs
            .iter()
            .filter(|job| job.state == JobState::Running)
    }

    /// Polls every running job without blocking, then removes the finished
    /// ones and returns their notices in launch order.
    pub fn update_jobs(&mut self) -> Vec<JobNotice> {
        let mut vanished = Vec::new();

        for job in self.jobs.iter_mut() {
            if job.state != JobState::Running {
                continue;
            }
            match waitpid(job.pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => {}
                Ok(status) => {
                    if let Some(outcome) = TerminationOutcome::from_wait_status(status) {
                        debug!(pid = %job.pid, %outcome, "reaped background job");
                        job.state = JobState::Completed(outcome);
                    }
                }
                Err(errno) => {
                    warn!(pid = %job.pid, %errno, "dropping background job that can no longer be waited on");
                    vanished.push(job.pid);
                }
            }
        }

        self.jobs.retain(|job| !vanished.contains(&job.pid));
        self.take_completed()
    }

    fn take_completed(&mut self) -> Vec<JobNotice> {
        let mut notices = Vec::new();
        self.jobs.retain(|job| match job.state {
            JobState::Completed(outcome) => {
                notices.push(JobNotice {
                    pid: job.pid,
                    outcome,
                });
                false
            }
            JobState::Running => true,
        });
        notices
    }
}

impl Default for JobTable {
    fn default() -> Self {
        JobTable::new(DEFAULT_CAPACITY)
    }
}

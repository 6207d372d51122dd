use super::state::JobState;
use crash_types::{CrashError, CrashResult};
use nix::unistd::Pid;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use tracing::debug;

pub const MAX_JOBS: usize = 32;

/// One process launched by the shell, tracked for job control.
///
/// `pid` is the leader of the job's process group (the child is made its
/// own group leader at launch, so pid == pgid).
#[derive(Debug, Clone)]
pub struct Job {
    pub job_number: u32,
    pub pid: Pid,
    pub state: JobState,
    pub cmd: String,
}

/// Fixed-capacity registry of known jobs.
///
/// Slots are reused once vacated, but job numbers come from a lifetime
/// counter and are never reused.
#[derive(Debug)]
pub struct JobTable {
    slots: [Option<Job>; MAX_JOBS],
    next_number: u32,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        JobTable {
            slots: std::array::from_fn(|_| None),
            next_number: 1,
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.slots.iter().any(|slot| slot.is_none())
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Registers a new running job in the first vacant slot.
    pub fn insert(&mut self, pid: Pid, cmd: &str) -> CrashResult<u32> {
        let idx = self
            .slots
            .iter()
            .position(|slot| slot.is_none())
            .ok_or(CrashError::TooManyJobs)?;

        let job_number = self.next_number;
        self.next_number += 1;
        self.slots[idx] = Some(Job {
            job_number,
            pid,
            state: JobState::Running,
            cmd: cmd.to_string(),
        });
        debug!("registered job {job_number} pid {pid} in slot {idx}");
        Ok(job_number)
    }

    pub fn find_by_job_number(&self, job_number: u32) -> Option<&Job> {
        self.list().find(|job| job.job_number == job_number)
    }

    pub fn find_by_job_number_mut(&mut self, job_number: u32) -> Option<&mut Job> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|job| job.job_number == job_number)
    }

    pub fn find_by_pid(&self, pid: Pid) -> Option<&Job> {
        self.list().find(|job| job.pid == pid)
    }

    pub fn find_by_pid_mut(&mut self, pid: Pid) -> Option<&mut Job> {
        self.slots.iter_mut().flatten().find(|job| job.pid == pid)
    }

    /// Occupied slots in table order.
    pub fn list(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().flatten()
    }

    /// Frees the slot holding `pid`, returning the job that occupied it.
    pub fn vacate(&mut self, pid: Pid) -> Option<Job> {
        self.slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|job| job.pid == pid))
            .and_then(|slot| slot.take())
    }
}

/// Shared job-control state: the job table plus the notification the
/// reaper thread uses to wake control paths blocked on a foreground job.
///
/// Every access goes through the mutex, so the table is never observed
/// mid-transition; this replaces the SIGCHLD masking a handler-based
/// design would need.
#[derive(Debug, Default)]
pub struct JobControl {
    pub table: Mutex<JobTable>,
    changed: Condvar,
}

impl JobControl {
    pub fn new() -> Arc<Self> {
        Arc::new(JobControl {
            table: Mutex::new(JobTable::new()),
            changed: Condvar::new(),
        })
    }

    /// Wakes every path blocked in [`wait_while_running`].
    ///
    /// [`wait_while_running`]: JobControl::wait_while_running
    pub fn notify_change(&self) {
        self.changed.notify_all();
    }

    /// Blocks until the job owning `pid` leaves the `Running` state,
    /// either stopped by a signal or vacated on exit. Returns at once if
    /// no such job is occupied.
    pub fn wait_while_running(&self, pid: Pid) {
        let mut table = self.table.lock();
        while table
            .find_by_pid(pid)
            .is_some_and(|job| job.state == JobState::Running)
        {
            self.changed.wait(&mut table);
        }
    }
}

//! The reaper: a dedicated signal thread.
//!
//! All job-control signals are blocked process-wide and consumed here
//! via sigwait, so no code ever runs in signal-handler context and the
//! job table needs no async-signal-safe discipline, just its mutex.

use super::job::JobControl;
use super::signal;
use super::state::JobState;
use super::status;
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error};

pub fn spawn(jobs: Arc<JobControl>) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("reaper".to_string())
        .spawn(move || run(jobs))
}

fn run(jobs: Arc<JobControl>) {
    let set = signal::job_signals();
    loop {
        match set.wait() {
            Ok(Signal::SIGCHLD) => reap_children(&jobs),
            Ok(sig @ (Signal::SIGINT | Signal::SIGTSTP)) => relay_to_foreground(sig),
            Ok(Signal::SIGQUIT) => {
                if let Some(pgid) = signal::foreground_pid() {
                    debug!("relaying SIGQUIT to foreground group {pgid}");
                    let _ = killpg(pgid, Signal::SIGQUIT);
                } else {
                    // Quit with no foreground job terminates the shell.
                    std::process::exit(0);
                }
            }
            Ok(other) => debug!("ignoring unexpected signal {other}"),
            Err(Errno::EINTR) => continue,
            Err(e) => {
                error!("sigwait failed: {e}");
                return;
            }
        }
    }
}

fn relay_to_foreground(sig: Signal) {
    if let Some(pgid) = signal::foreground_pid() {
        debug!("relaying {sig} to foreground group {pgid}");
        let _ = killpg(pgid, sig);
    }
}

/// Drains every pending child-state change. One SIGCHLD can stand for
/// several children, so this loops until waitpid reports nothing left.
pub(crate) fn reap_children(jobs: &JobControl) {
    loop {
        let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
        match waitpid(None, Some(flags)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
            Err(Errno::EINTR) => continue,
            Err(e) => {
                error!("waitpid failed: {e}");
                break;
            }
            Ok(wait_status) => reconcile(jobs, wait_status),
        }
    }
}

/// Applies one wait status to the job table and emits its status line.
/// Changes for pids the table does not know are ignored.
fn reconcile(jobs: &JobControl, wait_status: WaitStatus) {
    let mut table = jobs.table.lock();
    match wait_status {
        WaitStatus::Stopped(pid, sig) => {
            debug!("pid {pid} stopped by {sig}");
            if let Some(job) = table.find_by_pid_mut(pid) {
                job.state = JobState::Stopped;
                status::emit(&status::suspended_line(job.job_number, pid, &job.cmd));
            }
        }
        WaitStatus::Continued(pid) => {
            debug!("pid {pid} continued");
            if let Some(job) = table.find_by_pid_mut(pid) {
                job.state = JobState::Running;
                status::emit(&status::continued_line(job.job_number, pid, &job.cmd));
            }
        }
        WaitStatus::Exited(pid, code) => {
            debug!("pid {pid} exited with code {code}");
            if let Some(job) = table.vacate(pid) {
                status::emit(&status::finished_line(job.job_number, pid, code, &job.cmd));
            }
        }
        WaitStatus::Signaled(pid, sig, _core_dumped) => {
            debug!("pid {pid} killed by {sig}");
            if let Some(job) = table.vacate(pid) {
                let shown =
                    (sig != Signal::SIGKILL && sig != Signal::SIGINT).then_some(sig as i32);
                status::emit(&status::killed_line(job.job_number, pid, shown, &job.cmd));
            }
        }
        other => debug!("ignoring wait status {other:?}"),
    }
    drop(table);
    jobs.notify_change();
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    use std::process::Command;
    use std::time::{Duration, Instant};

    fn init() {
        let _ = tracing_subscriber::fmt::try_init();
    }

    /// Retries reaping until `done` holds or the deadline passes; child
    /// state changes take a moment to become visible to waitpid.
    fn reap_until(jobs: &JobControl, done: impl Fn(&JobControl) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            reap_children(jobs);
            if done(jobs) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }

    // One test, sequential phases: waitpid(-1) is process-global, so
    // concurrent child-spawning tests would steal each other's wait
    // statuses.
    #[test]
    fn child_state_changes_are_reconciled() {
        init();
        let jobs = JobControl::new();

        // An exiting child vacates its slot.
        let child = Command::new("true").spawn().expect("spawn true");
        let pid = Pid::from_raw(child.id() as i32);
        jobs.table.lock().insert(pid, "true").unwrap();
        assert!(reap_until(&jobs, |jobs| jobs
            .table
            .lock()
            .find_by_pid(pid)
            .is_none()));
        assert_eq!(jobs.table.lock().occupied(), 0);

        // Stop, continue, then kill a long-running child.
        let child = Command::new("sleep").arg("30").spawn().expect("spawn sleep");
        let pid = Pid::from_raw(child.id() as i32);
        jobs.table.lock().insert(pid, "sleep").unwrap();

        kill(pid, Signal::SIGSTOP).unwrap();
        assert!(reap_until(&jobs, |jobs| {
            jobs.table
                .lock()
                .find_by_pid(pid)
                .is_some_and(|job| job.state == JobState::Stopped)
        }));

        kill(pid, Signal::SIGCONT).unwrap();
        assert!(reap_until(&jobs, |jobs| {
            jobs.table
                .lock()
                .find_by_pid(pid)
                .is_some_and(|job| job.state == JobState::Running)
        }));

        kill(pid, Signal::SIGKILL).unwrap();
        assert!(reap_until(&jobs, |jobs| jobs
            .table
            .lock()
            .find_by_pid(pid)
            .is_none()));

        // A child the table never knew is reaped and ignored.
        let child = Command::new("true").spawn().expect("spawn true");
        let pid = Pid::from_raw(child.id() as i32);
        assert!(reap_until(&jobs, |_| kill(pid, None).is_err()));
        assert_eq!(jobs.table.lock().occupied(), 0);
    }
}

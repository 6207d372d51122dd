//! Status-line formatting and emission.
//!
//! Every line the shell prints about a job is built here so the exact
//! formats live in one place. Lines are written straight to the stdout
//! fd, unbuffered, because the reaper thread emits them outside any
//! stdio locking done by the control path.

use super::job::Job;
use nix::unistd::Pid;

pub fn listing_line(job: &Job) -> String {
    format!(
        "[{}] ({})  {}  {}",
        job.job_number, job.pid, job.state, job.cmd
    )
}

pub fn running_line(job_number: u32, pid: Pid, cmd: &str) -> String {
    format!("[{job_number}] ({pid})  running  {cmd}")
}

pub fn suspended_line(job_number: u32, pid: Pid, cmd: &str) -> String {
    format!("[{job_number}] ({pid})  suspended  {cmd}")
}

pub fn continued_line(job_number: u32, pid: Pid, cmd: &str) -> String {
    format!("[{job_number}] ({pid})  continued  {cmd}")
}

/// The exit code appears before the name only when it is non-zero.
pub fn finished_line(job_number: u32, pid: Pid, code: i32, cmd: &str) -> String {
    if code != 0 {
        format!("[{job_number}] ({pid})  finished  {code}  {cmd}")
    } else {
        format!("[{job_number}] ({pid})  finished  {cmd}")
    }
}

/// The signal number is omitted for SIGKILL and SIGINT terminations.
pub fn killed_line(job_number: u32, pid: Pid, signal: Option<i32>, cmd: &str) -> String {
    match signal {
        Some(signal) => format!("[{job_number}] ({pid})  killed  [{signal}]  {cmd}"),
        None => format!("[{job_number}] ({pid})  killed  {cmd}"),
    }
}

/// Writes one status line directly to stdout, bypassing stdio buffering.
pub fn emit(line: &str) {
    let mut bytes = Vec::with_capacity(line.len() + 1);
    bytes.extend_from_slice(line.as_bytes());
    bytes.push(b'\n');

    let mut written = 0;
    while written < bytes.len() {
        match nix::unistd::write(libc::STDOUT_FILENO, &bytes[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::state::JobState;

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    #[test]
    fn listing_uses_state_word() {
        let mut job = Job {
            job_number: 1,
            pid: pid(4321),
            state: JobState::Running,
            cmd: "sleep".to_string(),
        };
        assert_eq!(listing_line(&job), "[1] (4321)  running  sleep");
        job.state = JobState::Stopped;
        assert_eq!(listing_line(&job), "[1] (4321)  suspended  sleep");
    }

    #[test]
    fn launch_and_transition_lines() {
        assert_eq!(running_line(1, pid(100), "sleep"), "[1] (100)  running  sleep");
        assert_eq!(
            suspended_line(2, pid(101), "cat"),
            "[2] (101)  suspended  cat"
        );
        assert_eq!(
            continued_line(2, pid(101), "cat"),
            "[2] (101)  continued  cat"
        );
    }

    #[test]
    fn finished_line_shows_nonzero_exit_code() {
        assert_eq!(
            finished_line(3, pid(102), 0, "true"),
            "[3] (102)  finished  true"
        );
        assert_eq!(
            finished_line(3, pid(102), 7, "false"),
            "[3] (102)  finished  7  false"
        );
    }

    #[test]
    fn killed_line_brackets_the_signal() {
        assert_eq!(
            killed_line(4, pid(103), None, "sleep"),
            "[4] (103)  killed  sleep"
        );
        assert_eq!(
            killed_line(4, pid(103), Some(15), "sleep"),
            "[4] (103)  killed  [15]  sleep"
        );
    }
}

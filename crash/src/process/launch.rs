use super::job::JobControl;
use super::signal;
use super::status;
use crash_types::{Context, CrashError, CrashResult};
use libc::STDERR_FILENO;
use nix::unistd::{ForkResult, Pid, execvp, fork, setpgid, tcsetpgrp, write};
use std::ffi::CString;
use tracing::{debug, error};

use crate::shell::SHELL_TERMINAL;

/// Launches an external command as a new job.
///
/// The table lock is held across the fork so the reaper cannot observe
/// the child before its slot exists; the child never touches the lock,
/// it only execs.
pub fn launch(
    jobs: &JobControl,
    ctx: &Context,
    argv: &[String],
    background: bool,
) -> CrashResult<()> {
    let name = &argv[0];

    // argv and the failure message are converted up front; after the
    // fork the child only sets its group, unblocks, and execs.
    let Ok(cargs) = argv
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<Result<Vec<_>, _>>()
    else {
        // A token with an interior NUL can never exec.
        ctx.write_stderr(exec_failure_message(name).trim_end()).ok();
        return Ok(());
    };
    let exec_err = exec_failure_message(name);

    let mut table = jobs.table.lock();
    if !table.has_capacity() {
        return Err(CrashError::TooManyJobs);
    }

    match unsafe { fork() } {
        Err(e) => {
            error!("fork failed: {e}");
            Err(CrashError::ForkFailed)
        }
        Ok(ForkResult::Child) => {
            // Own process group, default signal delivery, then exec.
            let _ = setpgid(Pid::from_raw(0), Pid::from_raw(0));
            let _ = signal::unblock_job_signals();
            let _ = execvp(&cargs[0], &cargs);
            let _ = write(STDERR_FILENO, exec_err.as_bytes());
            // Skip atexit handlers and stdio flushing inherited from
            // the shell; the child exits alone.
            unsafe { libc::_exit(1) };
        }
        Ok(ForkResult::Parent { child }) => {
            // Both sides call setpgid so the group exists no matter who
            // runs first; the child may already have exec'd.
            if let Err(e) = setpgid(child, child) {
                debug!("setpgid({child}) in parent: {e}");
            }

            let job_number = table.insert(child, name)?;
            debug!(
                "launched {name} as job {job_number} pid {child} (background: {background}, {} slots occupied)",
                table.occupied()
            );

            if background {
                status::emit(&status::running_line(job_number, child, name));
                return Ok(());
            }

            drop(table);
            wait_foreground(jobs, ctx, child);
            Ok(())
        }
    }
}

/// Hands the terminal to `pid`'s process group, blocks until that job is
/// no longer running, then reclaims the terminal for the shell. The
/// foreground indicator is always cleared and the terminal always
/// restored, whichever way the job leaves the running state.
pub fn wait_foreground(jobs: &JobControl, ctx: &Context, pid: Pid) {
    signal::set_foreground(pid);
    if ctx.interactive
        && let Err(e) = tcsetpgrp(SHELL_TERMINAL, pid)
    {
        debug!("tcsetpgrp({pid}) failed: {e}, continuing without terminal transfer");
    }

    jobs.wait_while_running(pid);

    if ctx.interactive
        && let Err(e) = tcsetpgrp(SHELL_TERMINAL, ctx.shell_pgid)
    {
        debug!("tcsetpgrp(shell {}) failed: {e}", ctx.shell_pgid);
    }
    signal::clear_foreground();
}

fn exec_failure_message(name: &str) -> String {
    format!("ERROR: cannot run {name}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::job::MAX_JOBS;
    use crate::process::state::JobState;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::{getpgrp, getpid};

    fn init() {
        let _ = tracing_subscriber::fmt::try_init();
    }

    fn quiet_context() -> Context {
        let mut ctx = Context::new(getpid(), getpgrp());
        ctx.interactive = false;
        ctx
    }

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn background_launch_registers_a_running_job() {
        init();
        let jobs = JobControl::new();
        let ctx = quiet_context();

        launch(&jobs, &ctx, &argv(&["sleep", "30"]), true).unwrap();

        let pid = {
            let table = jobs.table.lock();
            assert_eq!(table.occupied(), 1);
            let job = table.list().next().unwrap();
            assert_eq!(job.job_number, 1);
            assert_eq!(job.state, JobState::Running);
            assert_eq!(job.cmd, "sleep");
            job.pid
        };

        // The reaper is not running here, so just put the child down.
        kill(pid, Signal::SIGKILL).unwrap();
    }

    #[test]
    fn launch_is_refused_when_the_table_is_full() {
        init();
        let jobs = JobControl::new();
        let ctx = quiet_context();
        {
            let mut table = jobs.table.lock();
            for i in 0..MAX_JOBS {
                table
                    .insert(Pid::from_raw(10_000 + i as i32), "sleep")
                    .unwrap();
            }
        }

        // The capacity check runs before fork, so no child is created.
        let err = launch(&jobs, &ctx, &argv(&["sleep", "30"]), true).unwrap_err();
        assert_eq!(err, CrashError::TooManyJobs);
        assert_eq!(jobs.table.lock().occupied(), MAX_JOBS);
    }

    #[test]
    fn exec_failure_message_names_the_command() {
        init();
        assert_eq!(
            exec_failure_message("no-such-binary"),
            "ERROR: cannot run no-such-binary\n"
        );
    }
}

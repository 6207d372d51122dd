use anyhow::Result;
use nix::sys::signal::{SigHandler, SigSet, SigmaskHow, Signal, kill, signal, sigprocmask};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::{debug, error};

const NO_FOREGROUND: i32 = -1;

/// Pid of the job currently owning the controlling terminal, or -1 when
/// the shell itself does. Read by the signal thread to decide where
/// terminal-generated signals should be relayed.
static FOREGROUND_PID: AtomicI32 = AtomicI32::new(NO_FOREGROUND);

pub fn set_foreground(pid: Pid) {
    FOREGROUND_PID.store(pid.as_raw(), Ordering::SeqCst);
}

pub fn clear_foreground() {
    FOREGROUND_PID.store(NO_FOREGROUND, Ordering::SeqCst);
}

pub fn foreground_pid() -> Option<Pid> {
    let raw = FOREGROUND_PID.load(Ordering::SeqCst);
    (raw != NO_FOREGROUND).then(|| Pid::from_raw(raw))
}

/// The signals owned by the reaper thread: child-state changes plus the
/// terminal-generated control signals it relays to the foreground job.
pub fn job_signals() -> SigSet {
    let mut set = SigSet::empty();
    for sig in [
        Signal::SIGCHLD,
        Signal::SIGINT,
        Signal::SIGQUIT,
        Signal::SIGTSTP,
    ] {
        set.add(sig);
    }
    set
}

pub fn block_job_signals() -> Result<()> {
    sigprocmask(SigmaskHow::SIG_BLOCK, Some(&job_signals()), None)?;
    Ok(())
}

/// Drops the inherited block mask; called in the child between fork and
/// exec so the new program sees default signal delivery.
pub fn unblock_job_signals() -> Result<()> {
    sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&job_signals()), None)?;
    Ok(())
}

pub fn ignore_sigttou() -> Result<()> {
    unsafe {
        signal(Signal::SIGTTOU, SigHandler::SigIgn)?;
    }
    Ok(())
}

/// Fire-and-forget signal send; the resulting state change, if any, is
/// observed later by the reaper.
pub fn send_signal(pid: Pid, sig: Signal) -> Result<()> {
    debug!("sending {sig} to pid {pid}");
    match kill(pid, sig) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("failed to send {sig} to pid {pid}: {e}");
            Err(e.into())
        }
    }
}

use anyhow::Result;
use libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{Pid, isatty};
use std::fmt::Debug;
use std::fs::File;
use std::io::Write;
use std::mem;
use std::os::unix::io::FromRawFd;
use std::os::unix::io::RawFd;
use thiserror::Error;

/// User-facing error conditions of the shell.
///
/// Every variant renders as the exact message printed after the
/// `ERROR: ` prefix on stderr. All of them are recovered locally;
/// none is fatal to the shell itself.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CrashError {
    #[error("{0} takes no arguments")]
    TakesNoArguments(&'static str),

    #[error("fg needs exactly one argument")]
    FgUsage,

    #[error("bg needs some arguments")]
    BgUsage,

    #[error("bad argument for {cmd}: {arg}")]
    BadArgument { cmd: &'static str, arg: String },

    #[error("no job {0}")]
    NoJob(u32),

    #[error("no PID {0}")]
    NoPid(i32),

    #[error("too many jobs")]
    TooManyJobs,

    #[error("fork didn't work")]
    ForkFailed,
}

pub type CrashResult<T> = std::result::Result<T, CrashError>;

/// Per-invocation execution context handed to builtin commands.
#[derive(Clone)]
pub struct Context {
    pub shell_pid: Pid,
    pub shell_pgid: Pid,
    pub interactive: bool,
    pub infile: RawFd,
    pub outfile: RawFd,
    pub errfile: RawFd,
}

impl Context {
    pub fn new(shell_pid: Pid, shell_pgid: Pid) -> Self {
        Context {
            shell_pid,
            shell_pgid,
            interactive: isatty(STDIN_FILENO).unwrap_or(false),
            infile: STDIN_FILENO,
            outfile: STDOUT_FILENO,
            errfile: STDERR_FILENO,
        }
    }

    pub fn write_stdout(&self, msg: &str) -> Result<()> {
        let mut file = unsafe { File::from_raw_fd(self.outfile) };
        writeln!(&mut file, "{msg}")?;
        mem::forget(file);
        Ok(())
    }

    pub fn write_stderr(&self, msg: &str) -> Result<()> {
        let mut file = unsafe { File::from_raw_fd(self.errfile) };
        writeln!(&mut file, "{msg}")?;
        mem::forget(file);
        Ok(())
    }

    /// Report a user-facing error in the shell's standard format.
    pub fn report_error(&self, err: &CrashError) {
        self.write_stderr(&format!("ERROR: {err}")).ok();
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::result::Result<(), std::fmt::Error> {
        f.debug_struct("Context")
            .field("shell_pid", &self.shell_pid)
            .field("shell_pgid", &self.shell_pgid)
            .field("interactive", &self.interactive)
            .field("infile", &self.infile)
            .field("outfile", &self.outfile)
            .field("errfile", &self.errfile)
            .finish()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ExitStatus {
    ExitedWith(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = tracing_subscriber::fmt::try_init();
    }

    #[test]
    fn error_messages_match_shell_output() {
        init();
        assert_eq!(
            CrashError::TakesNoArguments("quit").to_string(),
            "quit takes no arguments"
        );
        assert_eq!(
            CrashError::TakesNoArguments("jobs").to_string(),
            "jobs takes no arguments"
        );
        assert_eq!(
            CrashError::FgUsage.to_string(),
            "fg needs exactly one argument"
        );
        assert_eq!(CrashError::BgUsage.to_string(), "bg needs some arguments");
        assert_eq!(
            CrashError::BadArgument {
                cmd: "nuke",
                arg: "%x".to_string()
            }
            .to_string(),
            "bad argument for nuke: %x"
        );
        assert_eq!(CrashError::NoJob(5).to_string(), "no job 5");
        assert_eq!(CrashError::NoPid(1234).to_string(), "no PID 1234");
        assert_eq!(CrashError::TooManyJobs.to_string(), "too many jobs");
        assert_eq!(CrashError::ForkFailed.to_string(), "fork didn't work");
    }
}

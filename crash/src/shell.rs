use crate::lexer;
use crate::process::job::JobControl;
use crate::process::launch;
use crate::process::signal::send_signal;
use crate::process::state::JobState;
use crate::process::status;
use anyhow::{Result, anyhow};
use crash_builtin::ShellProxy;
use crash_types::{Context, CrashError, CrashResult, ExitStatus};
use libc::STDIN_FILENO;
use nix::sys::signal::Signal;
use nix::unistd::{Pid, getpgrp, getpid};
use std::os::raw::c_int;
use std::sync::Arc;
use tracing::debug;

pub const SHELL_TERMINAL: c_int = STDIN_FILENO;

/// How a command-line token designates a job: `%N` is a job number, bare
/// digits are a pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSelector {
    Number(u32),
    Pid(i32),
}

/// Validates and parses a job-designating token. The numeric portion
/// must be all decimal digits; job numbers must be at least 1. Anything
/// else is a malformed argument, distinct from a lookup failure.
pub fn parse_selector(cmd: &'static str, token: &str) -> CrashResult<JobSelector> {
    let bad = || CrashError::BadArgument {
        cmd,
        arg: token.to_string(),
    };

    let (digits, is_job_number) = match token.strip_prefix('%') {
        Some(rest) => (rest, true),
        None => (token, false),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }

    if is_job_number {
        let number: u32 = digits.parse().map_err(|_| bad())?;
        if number < 1 {
            return Err(bad());
        }
        Ok(JobSelector::Number(number))
    } else {
        let pid: i32 = digits.parse().map_err(|_| bad())?;
        Ok(JobSelector::Pid(pid))
    }
}

pub struct Shell {
    pub ctx: Context,
    jobs: Arc<JobControl>,
}

impl Shell {
    pub fn new(jobs: Arc<JobControl>) -> Self {
        let ctx = Context::new(getpid(), getpgrp());
        Shell { ctx, jobs }
    }

    /// Evaluates one input line: every statement in it, in order.
    /// Returns the status of the last statement, zero for an empty line.
    pub fn eval_line(&mut self, line: &str) -> i32 {
        let mut code = 0;
        for statement in lexer::parse_line(line) {
            code = self.eval(statement.argv, statement.background);
        }
        code
    }

    /// Evaluates one statement: a builtin verb, or an external launch.
    pub fn eval(&mut self, argv: Vec<String>, background: bool) -> i32 {
        let Some(name) = argv.first() else {
            return 0;
        };

        if let Some(command) = crash_builtin::lookup(name) {
            let ctx = self.ctx.clone();
            let ExitStatus::ExitedWith(code) = command(&ctx, argv, self);
            return code;
        }

        match launch::launch(&self.jobs, &self.ctx, &argv, background) {
            Ok(()) => 0,
            Err(err) => {
                self.ctx.report_error(&err);
                1
            }
        }
    }

    fn builtin_jobs(&mut self, ctx: &Context, argv: &[String]) -> Result<()> {
        if argv.len() > 1 {
            return Err(CrashError::TakesNoArguments("jobs").into());
        }

        // One lock for the whole listing: a consistent snapshot, never a
        // job mid-transition.
        let table = self.jobs.table.lock();
        for job in table.list() {
            ctx.write_stdout(&status::listing_line(job))?;
        }
        Ok(())
    }

    fn builtin_nuke(&mut self, ctx: &Context, argv: &[String]) -> Result<()> {
        if argv.len() == 1 {
            let table = self.jobs.table.lock();
            for job in table.list() {
                debug!("nuking job {} pid {}", job.job_number, job.pid);
                send_signal(job.pid, Signal::SIGKILL).ok();
            }
            return Ok(());
        }

        // Each argument stands alone: a bad one is reported and the rest
        // are still processed.
        for arg in &argv[1..] {
            if let Err(err) = self.nuke_one(arg) {
                ctx.report_error(&err);
            }
        }
        Ok(())
    }

    fn nuke_one(&mut self, arg: &str) -> CrashResult<()> {
        let selector = parse_selector("nuke", arg)?;
        let table = self.jobs.table.lock();
        let job = match selector {
            JobSelector::Number(n) => table.find_by_job_number(n).ok_or(CrashError::NoJob(n))?,
            JobSelector::Pid(p) => table
                .find_by_pid(Pid::from_raw(p))
                .ok_or(CrashError::NoPid(p))?,
        };
        send_signal(job.pid, Signal::SIGKILL).ok();
        Ok(())
    }

    fn builtin_fg(&mut self, ctx: &Context, argv: &[String]) -> Result<()> {
        if argv.len() != 2 {
            return Err(CrashError::FgUsage.into());
        }

        let pid = self.resume_job("fg", &argv[1])?;
        launch::wait_foreground(&self.jobs, ctx, pid);
        Ok(())
    }

    fn builtin_bg(&mut self, ctx: &Context, argv: &[String]) -> Result<()> {
        if argv.len() < 2 {
            return Err(CrashError::BgUsage.into());
        }

        for arg in &argv[1..] {
            if let Err(err) = self.resume_job("bg", arg) {
                ctx.report_error(&err);
            }
        }
        Ok(())
    }

    /// Resolves a job-designating token and, if the job is stopped,
    /// continues it and marks it running. A job that is already running
    /// is left alone. Returns the job's pid.
    fn resume_job(&mut self, cmd: &'static str, arg: &str) -> CrashResult<Pid> {
        let selector = parse_selector(cmd, arg)?;
        let mut table = self.jobs.table.lock();
        let job = match selector {
            JobSelector::Number(n) => table
                .find_by_job_number_mut(n)
                .ok_or(CrashError::NoJob(n))?,
            JobSelector::Pid(p) => table
                .find_by_pid_mut(Pid::from_raw(p))
                .ok_or(CrashError::NoPid(p))?,
        };

        if job.state == JobState::Stopped {
            debug!("continuing stopped job {} pid {}", job.job_number, job.pid);
            send_signal(job.pid, Signal::SIGCONT).ok();
            job.state = JobState::Running;
        }
        Ok(job.pid)
    }
}

impl ShellProxy for Shell {
    fn exit_shell(&mut self) {
        debug!("shell exiting");
        std::process::exit(0);
    }

    fn dispatch(&mut self, ctx: &Context, cmd: &str, argv: Vec<String>) -> Result<()> {
        match cmd {
            "jobs" => self.builtin_jobs(ctx, &argv),
            "fg" => self.builtin_fg(ctx, &argv),
            "bg" => self.builtin_bg(ctx, &argv),
            "nuke" => self.builtin_nuke(ctx, &argv),
            _ => Err(anyhow!("unknown builtin: {cmd}")),
        }
    }
}
